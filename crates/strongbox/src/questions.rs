// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Security question catalog. Vaults store only the question id.

pub const QUESTIONS: &[(u32, &str)] = &[
    (1, "What was the name of your first pet?"),
    (2, "What is your mother's maiden name?"),
    (3, "What city were you born in?"),
    (4, "What was the name of your elementary school?"),
    (5, "What is your favorite book?"),
];

pub fn lookup(id: u32) -> Option<&'static str> {
    QUESTIONS
        .iter()
        .find(|(question_id, _)| *question_id == id)
        .map(|(_, text)| *text)
}

/// Question text, or a placeholder for ids outside the catalog.
pub fn text_for(id: u32) -> String {
    lookup(id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("question #{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_one_based_and_unique() {
        for (index, (id, _)) in QUESTIONS.iter().enumerate() {
            assert_eq!(*id as usize, index + 1);
        }
        assert_eq!(lookup(3), Some("What city were you born in?"));
        assert_eq!(lookup(0), None);
        assert_eq!(text_for(99), "question #99");
    }
}
