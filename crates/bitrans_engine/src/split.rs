use std::time::Duration;

use bitrans_core::{
    llm_split, parse_split_response, proportional_split, split_messages, SplitHalves,
    SplitMethod, SplitOutcome, SplitRequest,
};
use engine_logging::{engine_debug, engine_warn};

use crate::llm::{CompletionRequest, LlmClient};

/// Splits the requested segment, asking the LLM for the matching cut in the
/// secondary text. Never fails: a blank secondary side, a failed call or an
/// unparseable reply all produce the proportional split.
pub async fn assist_split(client: &dyn LlmClient, request: &SplitRequest) -> SplitOutcome {
    let outcome =
        |halves: SplitHalves, method: SplitMethod| SplitOutcome::new(request, halves, method);
    let fallback = || {
        outcome(
            proportional_split(&request.segment, request.side, request.position),
            SplitMethod::Proportional,
        )
    };

    if !request.needs_llm() {
        engine_debug!("split of segment {}: secondary text empty", request.segment_index);
        return fallback();
    }

    let timeout = Duration::from_secs(request.translate_config.timeout_threshold);
    let completion = CompletionRequest::new(&request.llm_config, split_messages(request), timeout);
    let text = match client.complete(&completion).await {
        Ok(completion) => completion.text,
        Err(err) => {
            engine_warn!("split of segment {} failed: {}", request.segment_index, err);
            return fallback();
        }
    };
    match parse_split_response(&text) {
        Ok(parts) => outcome(
            llm_split(&request.segment, request.side, request.position, parts),
            SplitMethod::Llm,
        ),
        Err(err) => {
            engine_warn!(
                "split of segment {}: unusable reply ({}), falling back",
                request.segment_index,
                err
            );
            fallback()
        }
    }
}
