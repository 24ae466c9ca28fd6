/// Quote a field per RFC 4180: wrap in double quotes when the value contains
/// a comma, quote, or newline, doubling any embedded quotes.
pub fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Multi-valued cells (specialties, tags) are joined with semicolons so the
/// row stays a single comma-separated record.
pub fn join_list(values: &[String]) -> String {
    values.join(";")
}

pub fn write_row(fields: &[String]) -> String {
    fields.iter()
        .map(|f| escape_field(f))
        .collect::<Vec<String>>()
        .join(",")
}

pub fn write_document(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&write_row(&header.iter().map(|h| h.to_string()).collect::<Vec<String>>()));
    out.push_str("\r\n");
    for row in rows {
        out.push_str(&write_row(row));
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_field_unquoted() {
        assert_eq!(escape_field("Jane Rivera"), "Jane Rivera");
    }

    #[test]
    fn test_comma_field_quoted() {
        assert_eq!(escape_field("Rivera, Jane"), "\"Rivera, Jane\"");
    }

    #[test]
    fn test_embedded_quotes_doubled() {
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_list_joined_with_semicolons() {
        let values = vec!["adhd".to_string(), "anxiety".to_string()];
        assert_eq!(join_list(&values), "adhd;anxiety");
    }

    #[test]
    fn test_document_has_crlf_rows() {
        let doc = write_document(
            &["name", "email"],
            &[vec!["Rivera, Jane".to_string(), "jane@example.com".to_string()]],
        );
        assert_eq!(doc, "name,email\r\n\"Rivera, Jane\",jane@example.com\r\n");
    }
}
