pub mod declare;
pub mod jsonl;
