//! Prompt assembly for retrieval-augmented answers.

use crate::document::Document;

/// Label each retrieved chunk as `Document N` (1-based, retrieval order) and join them.
pub fn format_context(documents: &[Document]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(index, document)| format!("Document {}:\n{}", index + 1, document.page_content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Wrap `context` in the answering instructions, followed by the literal question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant that answers questions about research papers.\n\
         Use only the following context to answer the question. If the answer cannot be found \
         in the context, say that you don't know based on the provided documents.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_labels_follow_retrieval_order() {
        let documents = vec![Document::new("first chunk"), Document::new("second chunk")];
        assert_eq!(
            format_context(&documents),
            "Document 1:\nfirst chunk\n\nDocument 2:\nsecond chunk"
        );
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn prompt_ends_with_the_literal_question() {
        let prompt = build_prompt("Document 1:\nalpha", "What is alpha?");
        assert!(prompt.contains("Context:\nDocument 1:\nalpha\n\n"));
        assert!(prompt.contains("cannot be found in the context"));
        assert!(prompt.ends_with("Question: What is alpha?\n\nAnswer:"));
    }
}
