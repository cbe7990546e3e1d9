mod mock_relevance_oracle;
mod openrouter_client;

pub use mock_relevance_oracle::MockRelevanceOracle;
pub use openrouter_client::{OpenRouterClient, create_openrouter_client};
