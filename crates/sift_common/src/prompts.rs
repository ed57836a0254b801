//! Prompt templates for the router and both answering pipelines
//!
//! Placeholders use `{name}` syntax and are filled by [`PromptTemplate::render`].

use crate::llm_client::PromptTemplate;

/// Routing prompt. The model is asked for exactly one of SQL, RAG or NONE.
pub const ROUTER_PROMPT: PromptTemplate = PromptTemplate::new(
    "router",
    "Instruction: You are a system router. Look at the question and output EXACTLY one word: 'SQL' or 'RAG'.\n\
     - Output 'SQL' if the user asks for data, counts, prices, or orders.\n\
     - Output 'RAG' if the user asks for policies, shipping, returns, or information.\n\
     - If it's a greeting or irrelevant, output 'NONE'.\n\n\
     Question: {question}\n\
     Decision:",
);

/// SQL generation prompt. Variables: `schema`, `question`.
pub const SQL_GENERATION_PROMPT: PromptTemplate = PromptTemplate::new(
    "sql_generation",
    "You are a SQL expert. Use the following schema to write a query.\n\
     Schema: {schema}\n\
     Question: {question}\n\
     Constraint: Use ONLY the column names present in the schema. If you see 'price' use that, if 'amount' use that.\n\
     Return ONLY the SQL code, with no explanation and no markdown.",
);

/// Narration prompt. Variables: `result`, `question`.
pub const NARRATION_PROMPT: PromptTemplate = PromptTemplate::new(
    "narration",
    "The database returned: {result}. Explain this naturally for the question: {question}",
);

/// Context-only answering prompt. Variables: `context`, `question`.
pub const RAG_PROMPT: PromptTemplate = PromptTemplate::new(
    "rag_answer",
    "Answer the question based ONLY on the following context. If not found, say 'Information not available'.\n\
     Context: {context}\n\
     Question: {question}",
);
