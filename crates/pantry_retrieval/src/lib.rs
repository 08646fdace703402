pub mod corpus;
pub mod index;
pub mod tokenizer;
pub mod weights;

pub use corpus::{load_corpus, parse_corpus};
pub use index::{RetrievalIndex, SearchHit};
pub use tokenizer::{tokenize, Tokens};
pub use weights::{cosine, term_frequency, TermWeights};
