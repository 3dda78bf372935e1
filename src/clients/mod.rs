pub mod aggregate_uploader;
pub mod question_bank_client;

pub use aggregate_uploader::{AggregateUploader, FormUploader};
pub use question_bank_client::{QuestionBank, QuestionBankClient};
