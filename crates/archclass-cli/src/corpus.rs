//! The concrete corpus adapter: reads labelled decks out of the relational
//! store backing the event/deck/archetype tables. The query shape and the
//! composite-array decklist encoding mirror a Postgres `card[]` column of
//! `(id int, name text, quantity int)` tuples.

use archclass_core::corpus::{CardLine, DeckEntry};
use sqlx::{Pool, Postgres, Row};

/// Reads `archetypes ⋈ decks ⋈ events` for one format, from a given
/// minimum date onward. Unlike `archclass_core::corpus::CorpusSource`
/// (a synchronous contract meant for in-process test fixtures), this
/// adapter's I/O is natively async, matching the rest of this stack.
pub struct PostgresCorpusSource {
    pool: Pool<Postgres>,
}

impl PostgresCorpusSource {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Fetches every `(id, name, archetype, format, date, mainboard,
    /// sideboard)` row for `format` with `date >= min_date` (an ISO-8601
    /// `YYYY-MM-DD` string). Decklist quantities for the same card name
    /// under different card IDs are pre-summed here.
    pub async fn fetch(&self, format: &str, min_date: &str) -> Result<Vec<DeckEntry>, sqlx::Error> {
        let capitalized = capitalize(format);
        let rows = sqlx::query(
            r#"
            SELECT
                a.id::text        AS id,
                a.name            AS name,
                a.archetype       AS archetype,
                e.format          AS format,
                e.date::text      AS date,
                d.mainboard::text AS mainboard,
                d.sideboard::text AS sideboard
            FROM archetypes a
            INNER JOIN decks d ON a.deck_id = d.id
            INNER JOIN events e ON d.event_id = e.id
            WHERE a.id IS NOT NULL
              AND e.format = $1
              AND e.date >= $2::date
            "#,
        )
        .bind(&capitalized)
        .bind(min_date)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(DeckEntry {
                id: row.get("id"),
                display_name: row.get("name"),
                archetype_raw: row.get("archetype"),
                format: row.get::<String, _>("format"),
                date: row.get("date"),
                mainboard: parse_decklist(row.get::<Option<String>, _>("mainboard").as_deref()),
                sideboard: parse_decklist(row.get::<Option<String>, _>("sideboard").as_deref()),
            });
        }
        Ok(entries)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Parses one Postgres composite-array text column (e.g. `mainboard`,
/// typed as `card[]` where `card` is `(id int, name text, quantity int)`)
/// into summed `CardLine`s.
///
/// Rather than splitting on literal `","` and patching up the cases where a
/// card name itself contains a quote or comma, this walks the array and
/// composite text formats directly — tracking quote/escape state one
/// character at a time — so embedded quotes, commas, and backslashes in a
/// card name are handled uniformly rather than as special cases.
fn parse_decklist(raw: Option<&str>) -> Vec<CardLine> {
    let Some(raw) = raw else { return Vec::new() };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "{}" || trimmed == "{NULL}" {
        return Vec::new();
    }
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);

    let mut counts: Vec<(String, u32)> = Vec::new();
    for element in split_array_elements(inner) {
        let fields = split_composite_fields(&element);
        if fields.len() != 3 {
            continue;
        }
        let name = fields[1].clone();
        let Ok(quantity) = fields[2].trim().parse::<u32>() else {
            continue;
        };
        if let Some(existing) = counts.iter_mut().find(|(n, _)| *n == name) {
            existing.1 += quantity;
        } else {
            counts.push((name, quantity));
        }
    }

    counts
        .into_iter()
        .map(|(name, quantity)| CardLine { name, quantity })
        .collect()
}

/// Splits a Postgres array's text body into its quoted elements, resolving
/// the array-level backslash escaping of `"` and `\` within each element.
fn split_array_elements(body: &str) -> Vec<String> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;
    let mut saw_any = false;

    for c in body.chars() {
        if escape {
            current.push(c);
            escape = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escape = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                elements.push(std::mem::take(&mut current));
                saw_any = true;
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() || !saw_any {
        elements.push(current);
    }
    elements
}

/// Splits one composite tuple's text body (`(id,"name",quantity)`) into
/// its fields, resolving the composite-level doubled-quote escaping of `"`
/// within a quoted field.
fn split_composite_fields(tuple: &str) -> Vec<String> {
    let inner = tuple
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(tuple);

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_decklist_is_empty() {
        assert_eq!(parse_decklist(Some("{}")), Vec::new());
        assert_eq!(parse_decklist(None), Vec::new());
    }

    #[test]
    fn parses_simple_tuples() {
        let raw = r#"{"(67210,\"Simian Spirit Guide\",4)","(22775,\"Blood Moon\",4)"}"#;
        let lines = parse_decklist(Some(raw));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Simian Spirit Guide");
        assert_eq!(lines[0].quantity, 4);
        assert_eq!(lines[1].name, "Blood Moon");
    }

    #[test]
    fn sums_duplicate_card_ids_under_one_name() {
        let raw = r#"{"(1,\"Mountain\",3)","(2,\"Mountain\",17)"}"#;
        let lines = parse_decklist(Some(raw));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Mountain");
        assert_eq!(lines[0].quantity, 20);
    }

    #[test]
    fn handles_embedded_comma_in_card_name() {
        let raw = r#"{"(1,\"Urza, Lord High Artificer\",1)"}"#;
        let lines = parse_decklist(Some(raw));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Urza, Lord High Artificer");
    }

    #[test]
    fn handles_doubled_quote_inside_composite_field() {
        // Composite text format escapes an embedded `"` by doubling it.
        let raw = r#"{"(1,\"6\"\" Searing Spear\",2)"}"#;
        let lines = parse_decklist(Some(raw));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "6\" Searing Spear");
        assert_eq!(lines[0].quantity, 2);
    }
}
