//! Prompt construction for clause extraction and summarization
//!
//! Prompts are QA-style: a fixed system framing, a per-clause-type question
//! block with a worked example, and the chunk text fenced off from the
//! instructions. Building a prompt is pure string assembly; nothing here
//! suspends or calls out.

use covenant_domain::{ClauseType, Prompt};

/// Token a response must carry when the clause is absent from the text
pub const NOT_FOUND_TOKEN: &str = "NOT_FOUND";

/// Delimiter the model is asked to place between disjoint clause instances
pub const SPAN_DELIMITER: &str = " ||| ";

const EXTRACTION_SYSTEM: &str = "\
You are a legal AI assistant specialized in contract analysis and clause extraction.

Your task is to identify and extract specific types of clauses from legal contracts with high accuracy.

CRITICAL INSTRUCTIONS:
- Extract ONLY the relevant clause text, maintaining exact wording from the contract
- If multiple instances of the clause exist, extract ALL of them separated by \" ||| \"
- Extract complete clauses - don't cut off mid-sentence
- If the clause spans multiple paragraphs, include all relevant paragraphs
- If the clause is definitely not present in the provided text, respond with \"NOT_FOUND\"
- Be thorough but precise - include all relevant text but exclude unrelated content
- Look for the substance of the clause, not just section headers";

const SUMMARY_SYSTEM: &str = "\
You are a legal expert specializing in contract analysis.
Your task is to generate concise, accurate summaries of legal contracts.
Focus on extracting the most important information.";

/// Builds extraction and summary prompts
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Create a prompt builder
    pub fn new() -> Self {
        Self
    }

    /// Build the extraction prompt for one clause type over one chunk of
    /// contract text
    pub fn extraction_prompt(&self, clause_type: ClauseType, chunk_text: &str) -> Prompt {
        let user = format!(
            "{question}\n\n{example}\nContract Text to Analyze:\n---\n{chunk_text}\n---\n\n\
             Instructions:\n\
             - Extract ALL relevant clauses that answer the question above\n\
             - If multiple relevant clauses exist in different parts of the text, extract all of them separated by \"{SPAN_DELIMITER}\"\n\
             - Provide the exact text from the contract - do not paraphrase or summarize\n\
             - Include complete sentences and paragraphs\n\
             - If you find NO relevant clause in this text, respond with exactly \"{NOT_FOUND_TOKEN}\"\n\n\
             Extracted Clause(s):",
            question = question_block(clause_type),
            example = worked_example(clause_type),
        );
        Prompt::new(EXTRACTION_SYSTEM, user)
    }

    /// Build the summary prompt over the (capped) contract text
    pub fn summary_prompt(&self, text: &str, min_words: usize, max_words: usize) -> Prompt {
        let user = format!(
            "Please provide a summary of the following contract in {min_words}-{max_words} words.\n\n\
             The summary MUST include:\n\
             1. Purpose of the agreement (what is this contract for?)\n\
             2. Key obligations of each party (what must each party do?)\n\
             3. Notable risks or penalties (what happens if obligations aren't met?)\n\n\
             Contract Text:\n{text}\n\n\
             Provide ONLY the summary, nothing else.\n\nSummary:"
        );
        Prompt::new(SUMMARY_SYSTEM, user)
    }

    /// Build a corrective re-prompt when a summary came back outside the
    /// word bounds. References the previous attempt and its actual length.
    pub fn summary_retry_prompt(
        &self,
        previous: &str,
        actual_words: usize,
        min_words: usize,
        max_words: usize,
    ) -> Prompt {
        let direction = if actual_words < min_words {
            "expand it"
        } else {
            "shorten it"
        };
        let user = format!(
            "The following contract summary is {actual_words} words, but it must be \
             between {min_words} and {max_words} words. Rewrite the summary to {direction} \
             so it falls within that range, keeping the purpose, key obligations, and \
             notable risks.\n\n\
             Previous summary:\n{previous}\n\n\
             Provide ONLY the rewritten summary, nothing else.\n\nSummary:"
        );
        Prompt::new(SUMMARY_SYSTEM, user)
    }
}

fn question_block(clause_type: ClauseType) -> &'static str {
    match clause_type {
        ClauseType::Termination => {
            "Question: What are the termination provisions in this contract?\n\n\
             Description: Look for clauses that specify:\n\
             - Conditions under which the agreement can be terminated (termination for cause, convenience, etc.)\n\
             - Notice periods required for termination\n\
             - Rights of either party to terminate\n\
             - Automatic termination conditions\n\
             - Effects of termination\n\
             - Survival of obligations after termination"
        }
        ClauseType::Confidentiality => {
            "Question: What are the confidentiality and non-disclosure obligations?\n\n\
             Description: Look for clauses that specify:\n\
             - What information is considered confidential or proprietary\n\
             - Obligations to protect confidential information\n\
             - Restrictions on disclosure to third parties\n\
             - Permitted uses of confidential information\n\
             - Duration of confidentiality obligations\n\
             - Exceptions to confidentiality (e.g., publicly available information)\n\
             - Return or destruction of confidential information"
        }
        ClauseType::Liability => {
            "Question: What are the liability, limitation of liability, and indemnification provisions?\n\n\
             Description: Look for clauses that specify:\n\
             - Limitations on liability (caps on damages, excluded types of damages)\n\
             - Indemnification obligations (who indemnifies whom and for what)\n\
             - Disclaimers of warranties\n\
             - Allocation of risk between parties\n\
             - Liability for breach of specific obligations\n\
             - Exclusions of consequential or indirect damages\n\
             - Maximum liability amounts"
        }
    }
}

fn worked_example(clause_type: ClauseType) -> &'static str {
    match clause_type {
        ClauseType::Termination => {
            "Here is an example of termination clause extraction:\n\n\
             Example:\n\
             Contract Text: \"Either Party may terminate this Agreement at any time, with or without cause, upon thirty (30) days prior written notice to the other Party. Upon termination for any reason, all rights and obligations of the Parties shall cease, except for those obligations that by their nature are intended to survive termination.\"\n\n\
             Extracted Clause: Either Party may terminate this Agreement at any time, with or without cause, upon thirty (30) days prior written notice to the other Party. Upon termination for any reason, all rights and obligations of the Parties shall cease, except for those obligations that by their nature are intended to survive termination.\n"
        }
        ClauseType::Confidentiality => {
            "Here is an example of confidentiality clause extraction:\n\n\
             Example:\n\
             Contract Text: \"The Receiving Party agrees to hold and maintain the Confidential Information in strict confidence and to take all reasonable precautions to protect such Confidential Information. The Receiving Party shall not, without the prior written approval of the Disclosing Party, disclose any Confidential Information to any third parties.\"\n\n\
             Extracted Clause: The Receiving Party agrees to hold and maintain the Confidential Information in strict confidence and to take all reasonable precautions to protect such Confidential Information. The Receiving Party shall not, without the prior written approval of the Disclosing Party, disclose any Confidential Information to any third parties.\n"
        }
        ClauseType::Liability => {
            "Here is an example of liability clause extraction:\n\n\
             Example:\n\
             Contract Text: \"IN NO EVENT SHALL EITHER PARTY BE LIABLE TO THE OTHER PARTY FOR ANY INDIRECT, INCIDENTAL, CONSEQUENTIAL, SPECIAL, OR PUNITIVE DAMAGES ARISING OUT OF OR RELATED TO THIS AGREEMENT. THE TOTAL LIABILITY OF PROVIDER UNDER THIS AGREEMENT SHALL NOT EXCEED THE TOTAL FEES PAID BY CLIENT DURING THE TWELVE (12) MONTHS PRECEDING THE CLAIM.\"\n\n\
             Extracted Clause: IN NO EVENT SHALL EITHER PARTY BE LIABLE TO THE OTHER PARTY FOR ANY INDIRECT, INCIDENTAL, CONSEQUENTIAL, SPECIAL, OR PUNITIVE DAMAGES ARISING OUT OF OR RELATED TO THIS AGREEMENT. THE TOTAL LIABILITY OF PROVIDER UNDER THIS AGREEMENT SHALL NOT EXCEED THE TOTAL FEES PAID BY CLIENT DURING THE TWELVE (12) MONTHS PRECEDING THE CLAIM.\n"
        }
    }
}
