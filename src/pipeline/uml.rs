//! Local PlantUML derivation from pseudocode.
//!
//! The workflow turns pseudocode into PlantUML server-side using two line
//! rules. The same rules are applied here so a pseudocode artifact can be
//! turned back into a diagram source without a network round-trip:
//!
//! 1. A line starting with `function` declares a class named by the text
//!    after the prefix, up to the next `function` or the first `(`.
//! 2. Otherwise, a line containing `calls` adds the relationship
//!    `X --> Y`: `X` is the last whitespace-separated token before the
//!    first `calls`, `Y` is the text after it up to the next `calls` or `(`.
//!
//! Both keywords match as plain substrings, so `functional x` declares the
//! class `al x` and `user recalls y()` yields `re --> y`. Lines that would
//! produce an empty class, caller or callee are skipped.
//!
//! Classes are emitted sorted and deduplicated; relationships keep input
//! order.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static RE_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^function(.*?)(?:function|\(|$)").unwrap());

static RE_CALLS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)calls(.*?)(?:calls|\(|$)").unwrap());

/// Derive PlantUML source from pseudocode.
pub fn derive_uml(pseudocode: &str) -> String {
    let mut classes = BTreeSet::new();
    let mut relationships = Vec::new();

    for line in pseudocode.lines() {
        let line = line.trim();
        if let Some(caps) = RE_FUNCTION.captures(line) {
            let name = caps[1].trim();
            if !name.is_empty() {
                classes.insert(name.to_string());
            }
        } else if let Some(caps) = RE_CALLS.captures(line) {
            let caller = caps[1].split_whitespace().last();
            let callee = caps[2].trim();
            if let Some(caller) = caller {
                if !callee.is_empty() {
                    relationships.push((caller.to_string(), callee.to_string()));
                }
            }
        }
    }

    let mut uml = String::from("@startuml\n");
    for class in &classes {
        uml.push_str(&format!("class {} {{\n}}\n", class));
    }
    for (caller, callee) in &relationships {
        uml.push_str(&format!("{} --> {}\n", caller, callee));
    }
    uml.push_str("@enduml");
    uml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pseudocode_gives_empty_diagram() {
        assert_eq!(derive_uml(""), "@startuml\n@enduml");
    }

    #[test]
    fn functions_become_sorted_unique_classes() {
        let pseudo = "function save_user(user)\n  function load(id)\nfunction save_user(user)\n";
        assert_eq!(
            derive_uml(pseudo),
            "@startuml\nclass load {\n}\nclass save_user {\n}\n@enduml"
        );
    }

    #[test]
    fn calls_become_relationships_in_order() {
        let pseudo = "\
function main()
    main calls load_config(path)
    main calls db.query(sql)
function load_config(path)
";
        let uml = derive_uml(pseudo);
        assert!(uml.contains("class main {\n}\n"));
        assert!(uml.contains("class load_config {\n}\n"));
        let first = uml.find("main --> load_config").unwrap();
        let second = uml.find("main --> db.query").unwrap();
        assert!(first < second);
        assert!(uml.ends_with("@enduml"));
    }

    #[test]
    fn caller_is_last_word_before_calls() {
        let uml = derive_uml("then the handler calls respond()");
        assert_eq!(uml, "@startuml\nhandler --> respond\n@enduml");
    }

    #[test]
    fn callee_without_parentheses() {
        let uml = derive_uml("worker calls cleanup");
        assert!(uml.contains("worker --> cleanup\n"));
    }

    #[test]
    fn calls_without_caller_is_ignored() {
        assert_eq!(derive_uml("calls nothing()"), "@startuml\n@enduml");
    }

    #[test]
    fn keywords_match_as_substrings() {
        assert_eq!(
            derive_uml("functional overview(x)"),
            "@startuml\nclass al overview {\n}\n@enduml"
        );
        assert_eq!(
            derive_uml("functionsave()"),
            "@startuml\nclass save {\n}\n@enduml"
        );
        assert_eq!(
            derive_uml("the user recalls history()"),
            "@startuml\nre --> history\n@enduml"
        );
        assert_eq!(derive_uml("x callsign y"), "@startuml\nx --> ign y\n@enduml");
    }

    #[test]
    fn segments_stop_at_repeated_keyword() {
        assert_eq!(
            derive_uml("function run_function(x)"),
            "@startuml\nclass run_ {\n}\n@enduml"
        );
        assert_eq!(
            derive_uml("a calls b then calls c()"),
            "@startuml\na --> b then\n@enduml"
        );
    }

    #[test]
    fn empty_names_are_skipped() {
        assert_eq!(
            derive_uml("function (x)\nworker calls\nfunction"),
            "@startuml\n@enduml"
        );
    }

    #[test]
    fn function_line_takes_precedence_over_calls() {
        let uml = derive_uml("function dispatcher calls(x)");
        assert_eq!(uml, "@startuml\nclass dispatcher calls {\n}\n@enduml");
    }
}
