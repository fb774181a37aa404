//! Property tests for name validation, literal quoting and angle sampling.

use common::model::sql::Identifier;
use corgidb::db::describe::parse_create_table;
use corgidb::ddl::quote_literal;
use corgidb::generator::linspace;
use corgidb::units::Angle;
use proptest::prelude::*;

proptest! {
    /// Anything that parses renders as a single backtick-quoted token.
    #[test]
    fn parsed_identifiers_quote_cleanly(raw in "\\PC{0,80}") {
        if let Ok(id) = Identifier::parse(&raw) {
            let quoted = id.quoted();
            prop_assert!(quoted.starts_with('`') && quoted.ends_with('`'));
            prop_assert_eq!(quoted.matches('`').count(), 2);
            prop_assert!(id.as_str().len() <= 64);
            prop_assert!(!id.as_str().contains(|c: char| c.is_whitespace() || c == ';'));
        }
    }

    #[test]
    fn valid_names_are_accepted(raw in "[A-Za-z_][A-Za-z0-9_]{0,63}") {
        let parsed = Identifier::parse(&raw).unwrap();
        prop_assert_eq!(parsed.as_str(), raw.as_str());
    }

    /// A comment written into DDL text reads back unchanged.
    #[test]
    fn comments_read_back(comment in "[^\\r\\n\\\\]{0,60}") {
        let ddl = format!(
            "CREATE TABLE `t` (\n  `c` double DEFAULT NULL COMMENT {}\n) ENGINE=InnoDB",
            quote_literal(&comment)
        );
        let columns = parse_create_table(&ddl);
        prop_assert_eq!(columns.len(), 1);
        prop_assert_eq!(columns[0].comment.as_deref(), Some(comment.as_str()));
        prop_assert_eq!(columns[0].definition.as_str(), "double DEFAULT NULL");
    }

    #[test]
    fn sampled_angles_span_the_working_range(
        iwa in 0.01f64..5.0,
        width in 0.01f64..20.0,
        n in 2usize..500,
    ) {
        let (start, stop) = (Angle::from_arcsec(iwa), Angle::from_arcsec(iwa + width));
        let points = linspace(start, stop, n);
        prop_assert_eq!(points.len(), n);
        prop_assert_eq!(points[0], start);
        prop_assert_eq!(points[n - 1], stop);
        prop_assert!(points.windows(2).all(|w| w[0] < w[1]));
    }
}
