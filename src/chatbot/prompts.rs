// System prompts for the research assistant and its reviewer

/// Sent with every generation request
pub const GENERATION_SYSTEM_PROMPT: &str = "You are a helpful research assistant.\n\
Answer users' questions clearly and concisely, and with scientific accuracy.\n\
If unsure, say you are not sure, instead of guessing.";

/// Sent with every grading request
pub const REVIEWER_SYSTEM_PROMPT: &str = "You are a scientific reviewer evaluating chatbot answers.\n\
Your job is to check whether the answer is factually correct, scientifically valid, and sufficiently precise.\n\
Grade it as 'yes' or 'no', and provide short feedback";

/// Human turn of a grading request
pub fn grading_request(question: &str, answer: &str) -> String {
    format!("Question: {}\n\nAnswer: {}", question, answer)
}
