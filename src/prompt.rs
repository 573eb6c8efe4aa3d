use crate::batch::Batch;
use crate::taxonomy::{NOT_AN_ACCOUNT_TYPE, Taxonomy};
use crate::types::{ChatCompletionRequest, ChatMessage};

/// Builds chat completion requests for account batches.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    model: String,
    temperature: f32,
    max_tokens: u32,
    taxonomy: Taxonomy,
}

impl PromptBuilder {
    pub fn new(
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        taxonomy: Taxonomy,
    ) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_tokens,
            taxonomy,
        }
    }

    pub fn build_request(&self, batch: &Batch<'_>) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(batch.items.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt(batch.items.len())));
        messages.extend(
            batch
                .items
                .iter()
                .map(|name| ChatMessage::user(format!("Account name: {name}"))),
        );

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn system_prompt(&self, count: usize) -> String {
        let mut prompt = format!(
            "You are a skilled accountant. Determine the closest matching account type for each \
             account below. If there is no matching type, name it '{NOT_AN_ACCOUNT_TYPE}'. \
             The possible types are:\n"
        );
        for category in self.taxonomy.categories() {
            prompt.push_str("- ");
            prompt.push_str(category);
            prompt.push('\n');
        }
        prompt.push_str(&format!(
            "\nReply with exactly {count} lines, one per account, in the order the accounts \
             are given. Each line must contain only the account type, taken verbatim from the \
             list above, or '{NOT_AN_ACCOUNT_TYPE}'. Do not add numbering, account names or any \
             other words."
        ));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn builder() -> PromptBuilder {
        PromptBuilder::new("gpt-4-turbo", 0.5, 1000, Taxonomy::default())
    }

    #[test]
    fn one_user_turn_per_account_in_order() {
        let accounts = vec!["Cash on Hand".to_string(), "Office Rent".to_string()];
        let batch = Batch {
            offset: 30,
            items: &accounts,
        };

        let request = builder().build_request(&batch);

        assert_eq!(request.model, "gpt-4-turbo");
        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1], ChatMessage::user("Account name: Cash on Hand"));
        assert_eq!(request.messages[2], ChatMessage::user("Account name: Office Rent"));
    }

    #[test]
    fn system_prompt_lists_taxonomy_and_line_count() {
        let accounts: Vec<String> = (0..3).map(|i| format!("a{i}")).collect();
        let batch = Batch {
            offset: 0,
            items: &accounts,
        };

        let request = builder().build_request(&batch);
        let system = &request.messages[0].content;

        for category in Taxonomy::default().categories() {
            assert!(system.contains(&format!("- {category}\n")), "missing {category}");
        }
        assert!(system.contains("exactly 3 lines"));
        assert!(system.contains("'Not an Account type'"));
    }

    #[test]
    fn requests_are_deterministic() {
        let accounts = vec!["Bank".to_string()];
        let batch = Batch {
            offset: 0,
            items: &accounts,
        };
        let builder = builder();

        assert_eq!(builder.build_request(&batch), builder.build_request(&batch));
    }
}
