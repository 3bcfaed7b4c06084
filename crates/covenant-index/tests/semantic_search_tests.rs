//! End-to-end tests for clause similarity search over contract records

use covenant_domain::{
    ClauseRecord, ClauseSpan, ClauseType, ContractRecord, DocumentId, DocumentStats,
    EmbeddingProvider,
};
use covenant_index::{cosine_similarity, ClauseIndex, MockEmbeddingModel, DEFAULT_TOP_K};
use covenant_llm::RetryPolicy;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

fn clause_index() -> ClauseIndex {
    ClauseIndex::new(Arc::new(MockEmbeddingModel::new(128)), RetryPolicy::default())
}

fn record(id: &str, spans: &[(ClauseType, Option<&str>)]) -> ContractRecord {
    let mut clauses = BTreeMap::new();
    for (clause_type, span) in spans {
        let record = match span {
            Some(text) => ClauseRecord {
                clause_type: *clause_type,
                span: ClauseSpan::Found(text.to_string()),
                source_chunks: vec![0],
            },
            None => ClauseRecord::not_found(*clause_type),
        };
        clauses.insert(*clause_type, record);
    }
    ContractRecord {
        document: DocumentId::new(id),
        summary: Some("A short summary.".to_string()),
        clauses,
        stats: DocumentStats::default(),
    }
}

#[tokio::test]
async fn test_index_contract_skips_absent_clauses() {
    let index = clause_index();
    let record = record(
        "msa_2024",
        &[
            (
                ClauseType::Termination,
                Some("Either party may terminate upon thirty days written notice."),
            ),
            (ClauseType::Confidentiality, None),
            (
                ClauseType::Liability,
                Some("Total liability shall not exceed the fees paid."),
            ),
        ],
    );

    let indexed = index.index_contract(&record).await;
    assert_eq!(indexed, 2);
    assert_eq!(index.len(), 2);
}

#[tokio::test]
async fn test_query_finds_exact_span_across_documents() {
    let index = clause_index();
    let termination = "Either party may terminate this Agreement upon thirty days notice.";

    index
        .index_contract(&record("alpha", &[(ClauseType::Termination, Some(termination))]))
        .await;
    index
        .index_contract(&record(
            "beta",
            &[(
                ClauseType::Confidentiality,
                Some("All Confidential Information shall be held in strict confidence."),
            )],
        ))
        .await;

    let hits = index.query(termination, DEFAULT_TOP_K).await.unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].record.document.as_str(), "alpha");
    assert_eq!(hits[0].record.clause_type, ClauseType::Termination);
    assert!(hits[0].similarity > 0.99);
}

#[tokio::test]
async fn test_hits_are_sorted_and_bounded() {
    let index = clause_index();
    for i in 0..8 {
        index
            .index_contract(&record(
                &format!("doc_{i}"),
                &[(
                    ClauseType::Liability,
                    Some(&format!("Liability provision number {i} caps damages.")) ,
                )],
            ))
            .await;
    }

    let hits = index
        .query("Liability provision number 3 caps damages.", DEFAULT_TOP_K)
        .await
        .unwrap();
    assert_eq!(hits.len(), DEFAULT_TOP_K);
    for pair in hits.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[tokio::test]
async fn test_hit_similarity_matches_exact_cosine() {
    let model = Arc::new(MockEmbeddingModel::new(128));
    let index = ClauseIndex::new(
        Arc::clone(&model) as Arc<dyn EmbeddingProvider>,
        RetryPolicy::default(),
    );
    let span = "Either party may terminate upon thirty days written notice.";
    index
        .index_contract(&record("alpha", &[(ClauseType::Termination, Some(span))]))
        .await;

    let query = "notice period required for termination";
    let hits = index.query(query, DEFAULT_TOP_K).await.unwrap();

    let exact = cosine_similarity(
        &model.embed(query).await.unwrap(),
        &model.embed(span).await.unwrap(),
    );
    assert!((hits[0].similarity - exact).abs() < 1e-3);
}

#[tokio::test]
async fn test_queries_run_alongside_inserts() {
    let index = Arc::new(clause_index());
    for i in 0..4 {
        index
            .insert(
                &DocumentId::new("seed"),
                ClauseType::Termination,
                &format!("termination provision number {i}"),
            )
            .await
            .unwrap();
    }

    let mut tasks = JoinSet::new();
    for i in 0..12 {
        let index = Arc::clone(&index);
        if i % 2 == 0 {
            tasks.spawn(async move {
                index
                    .insert(
                        &DocumentId::new(format!("doc_{i}")),
                        ClauseType::Liability,
                        &format!("liability cap number {i}"),
                    )
                    .await
                    .map(|()| 0)
            });
        } else {
            tasks.spawn(async move {
                index
                    .query("termination provision number 1", 3)
                    .await
                    .map(|hits| hits.len())
            });
        }
    }
    while let Some(joined) = tasks.join_next().await {
        assert!(joined.unwrap().is_ok());
    }
    assert_eq!(index.len(), 10);
}

#[tokio::test]
async fn test_record_with_no_found_clauses_indexes_nothing() {
    let index = clause_index();
    let empty = record(
        "empty",
        &[
            (ClauseType::Termination, None),
            (ClauseType::Confidentiality, None),
            (ClauseType::Liability, None),
        ],
    );

    assert_eq!(index.index_contract(&empty).await, 0);
    assert!(index.is_empty());
    assert!(index.query("anything", DEFAULT_TOP_K).await.unwrap().is_empty());
}
