//! Business vocabulary with mandatory SQL logic

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessTerm {
    pub term: String,
    pub definition: String,
    pub sql_logic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BusinessDictionary {
    pub terms: Vec<BusinessTerm>,
}

impl BusinessDictionary {
    pub fn new(terms: Vec<BusinessTerm>) -> Self {
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn render(&self) -> String {
        self.terms
            .iter()
            .map(|t| {
                let mut line = format!("- \"{}\" means: {}.", t.term, t.definition.trim_end_matches('.'));
                if let Some(logic) = t.sql_logic.as_deref().filter(|l| !l.trim().is_empty()) {
                    line.push_str(&format!(" (Mandatory SQL logic: `{}`)", logic.trim()));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
