use super::types::{quote_identifier, FilterOrderInfo};

pub struct FilterOrder;

impl FilterOrder {
    /// `ORDER BY` clause for already validated columns; empty when unordered.
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() { return String::new(); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {}", quote_identifier(&i.column), i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
