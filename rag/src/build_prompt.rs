use crate::retrieve_chunks::Section;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

pub fn build_prompt(topic: &str, question: &str, sections: &[Section]) -> (Vec<Message>, String) {
    let context = format_context(sections);

    let user_content = format!(
        "You are a knowledgeable assistant specializing in {topic}.\n\
         Use the following context information to address the user's query.\n\n\
         Context:\n{context}\n\n\
         User Query:\n{question}\n\n\
         Generate a clear, precise, and actionable response."
    );

    let messages = vec![Message {
        role: "user".to_string(),
        content: user_content,
    }];

    (messages, context)
}

pub fn format_context(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| match s.page {
            Some(page) => format!("Page {}:\n{}", page, s.text),
            None => format!("Page ?:\n{}", s.text),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(text: &str, page: Option<u32>) -> Section {
        Section {
            text: text.to_string(),
            page,
        }
    }

    #[test]
    fn context_joins_pages_with_blank_lines() {
        let ctx = format_context(&[section("first", Some(1)), section("second", Some(4))]);
        assert_eq!(ctx, "Page 1:\nfirst\n\nPage 4:\nsecond");
    }

    #[test]
    fn unknown_page_is_marked() {
        assert_eq!(format_context(&[section("x", None)]), "Page ?:\nx");
    }

    #[test]
    fn single_user_message_carries_topic_context_and_query() {
        let (messages, context) = build_prompt(
            "Titanic Data Analysis",
            "What is the survival rate?",
            &[section("38% survived", Some(3))],
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        let prompt = &messages[0].content;
        assert!(prompt.contains("specializing in Titanic Data Analysis."));
        assert!(prompt.contains(&context));
        assert!(prompt.contains("User Query:\nWhat is the survival rate?"));
        assert!(prompt.ends_with("actionable response."));
    }
}
