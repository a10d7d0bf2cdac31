//! Prompt templates for the summarize and answer flows.
//!
//! Both ask for HTML output: the result is inserted into the page as-is.

/// Build the summarization prompt for a discussion.
pub fn summary_prompt(discussion_text: &str) -> String {
    format!(
        "Analyze and summarize the following Hacker News discussion using these steps:

1. Read through the entire discussion carefully.
2. Identify the main topics and themes being discussed.
3. Note any interesting insights or unique perspectives shared by commenters.
4. Consider the overall sentiment of the discussion (positive, negative, neutral, or mixed).
5. Organize the key points into a logical structure.
6. Summarize the discussion concisely, highlighting the most important aspects.
7. Format the summary using HTML markup, utilizing <ol> or <ul> for listing points.

Remember:
- Do not include a title or opening paragraph like \"Here is a summary of the discussion.\"
- Focus on surfacing valuable insights and unique viewpoints.
- Ensure the summary is concise yet comprehensive.

Discussion content:
<text>{discussion_text}</text>

Based on the above steps, provide a well-structured summary of the Hacker News discussion."
    )
}

/// Build the prompt answering `question` from a discussion.
pub fn answer_prompt(discussion_text: &str, question: &str) -> String {
    format!(
        "You are an AI assistant analyzing a Hacker News discussion. Your task is to answer a specific question based on the content of the discussion.

Discussion content:
{discussion_text}

Question to answer:
{question}

Instructions:
1. Carefully read and analyze the discussion content.
2. Focus on answering the given question accurately and concisely.
3. If the answer is not directly stated in the discussion, use the context to provide the most relevant and informed response possible.
4. Include relevant quotes or examples from the discussion to support your answer, if applicable.
5. If the question cannot be answered based on the given discussion, state this clearly and explain why.
6. Format your response using appropriate HTML markup for readability (e.g., <p>, <ul>, <ol>, <strong>, <em>).
7. Ensure your answer is objective and based solely on the information provided in the discussion.

Provide your answer below:"
    )
}
