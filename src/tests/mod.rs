pub mod test_dueling;
pub mod test_history;
