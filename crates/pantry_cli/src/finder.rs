//! Ingredient-driven lookups: phrase the question, then tie the agent's
//! answer back to concrete corpus entries.

use pantry_core::Document;

pub fn compose_question(ingredients: &str, max_minutes: u32) -> String {
    let mut question = format!("What can I make using {}?", ingredients.trim());
    if max_minutes > 0 {
        question.push_str(&format!(
            " The recipe should take around {max_minutes} minutes or less."
        ));
    }
    question
}

/// Documents whose titles contain a name listed in `answer` (comma-separated,
/// case-insensitive). One document per name, first match wins.
pub fn match_documents<'a>(answer: &str, documents: &'a [Document]) -> Vec<&'a Document> {
    let mut matched: Vec<&Document> = Vec::new();
    for part in answer.split(", ") {
        let name = part.trim_matches(|c: char| c == '.' || c.is_whitespace());
        if name.is_empty() {
            continue;
        }
        let needle = name.to_lowercase();
        let hit = documents
            .iter()
            .find(|doc| doc.title.to_lowercase().contains(&needle));
        if let Some(doc) = hit {
            if !matched.iter().any(|m| m.id == doc.id) {
                matched.push(doc);
            }
        }
    }
    matched
}

/// The document text without the leading title the corpus loader puts there.
pub fn ingredients(doc: &Document) -> &str {
    doc.body
        .strip_prefix(doc.title.as_str())
        .map(str::trim_start)
        .unwrap_or(&doc.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("recipe0", "Chicken Fried Rice", "chicken rice egg"),
            Document::new("recipe1", "Lemon Chicken", "chicken lemon"),
            Document::new("recipe2", "Rice Pudding", "rice milk sugar"),
        ]
    }

    #[test]
    fn test_compose_question() {
        assert_eq!(
            compose_question("chicken, rice", 0),
            "What can I make using chicken, rice?"
        );
        assert_eq!(
            compose_question(" eggs ", 20),
            "What can I make using eggs? The recipe should take around 20 minutes or less."
        );
    }

    #[test]
    fn test_match_documents_by_title() {
        let docs = docs();
        let ids: Vec<&str> = match_documents("Chicken Fried Rice, rice pudding.", &docs)
            .into_iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["recipe0", "recipe2"]);
    }

    #[test]
    fn test_match_documents_skips_unknown_and_duplicates() {
        let docs = docs();
        assert!(match_documents("Beef Stew", &docs).is_empty());
        assert!(match_documents("", &docs).is_empty());
        let matched = match_documents("Lemon Chicken, lemon chicken", &docs);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_ingredients_drop_leading_title() {
        let doc = Document::new("recipe0", "Apple Pie", "Apple Pie apples flour");
        assert_eq!(ingredients(&doc), "apples flour");
        let doc = Document::new("recipe1", "Toast", "bread butter");
        assert_eq!(ingredients(&doc), "bread butter");
    }
}
