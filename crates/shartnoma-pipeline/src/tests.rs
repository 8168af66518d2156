//! End-to-end runs over mocked collaborators

use crate::{CancelSignal, MockSpellChecker, Pipeline, PipelineConfig, NOT_A_CONTRACT_RECOMMENDATIONS};
use async_trait::async_trait;
use proptest::prelude::*;
use shartnoma_domain::traits::{CollaboratorError, PassageRetriever, RetrievedPassage};
use shartnoma_domain::{
    AnalysisRequest, AnalysisResult, AnalysisStatus, ComplianceIssue, ContainerKind, ContractType, Document, IssueSource,
    IssueType, Language, Script, SectionLabel, Severity, Stage, WarningCode,
};
use shartnoma_extract::mock::{blank_pdf_fixture, docx_fixture, MockRasterizer, MockRecognizer};
use shartnoma_extract::{OcrConfig, OcrEngine, TextExtractor};
use shartnoma_llm::MockProvider;
use shartnoma_rag::{RagConfig, RagOrchestrator, SectionAnalyzer, SectionRequest, SectionReview};
use shartnoma_store::embedding::HashingEmbeddingModel;
use shartnoma_store::{LawArticle, LawCorpus};
use std::sync::Arc;
use std::time::Duration;

/// Service contract without a liability section and with a 60% penalty
const RU_CONTRACT: &str = "ДОГОВОР ОКАЗАНИЯ УСЛУГ № 7-А
г. Ташкент                                   «15» марта 2024 г.

ООО «Восток», именуемое в дальнейшем «Заказчик», с одной стороны, и ИП Каримов, именуемый в дальнейшем «Исполнитель», с другой стороны, заключили настоящий договор:

1. ПРЕДМЕТ ДОГОВОРА
1.1. Исполнитель оказывает услуги по уборке помещений.

2. ЦЕНА ДОГОВОРА И ПОРЯДОК РАСЧЕТОВ
2.1. Стоимость услуг составляет 5 000 000 сум в месяц.
2.2. За просрочку оплаты Заказчик уплачивает неустойку в размере 60% от суммы договора.

3. СРОК ДЕЙСТВИЯ ДОГОВОРА
3.1. Договор действует до 31.12.2024.

4. РЕКВИЗИТЫ СТОРОН
Заказчик: ООО «Восток», ИНН 301234567
Исполнитель: ИП Каримов, ИНН 402345678";

const UZ_CONTRACT: &str = "XIZMAT KO'RSATISH SHARTNOMASI № 15/2024
Toshkent shahri, 12.03.2024

\"Alfa\" MChJ (Buyurtmachi) va \"Beta\" MChJ (Ijrochi) quyidagilar haqida ushbu shartnmani tuzdilar:

1. SHARTNOMA PREDMETI
1.1. Ijrochi buxgalteriya xizmatlarini ko'rsatadi.

2. NARX
2.1. Shartnoma narxi 10 000 000 so'm.

3. SHARTNOMA MUDDATI
3.1. Shartnoma 31.12.2024 gacha amal qiladi.";

const VALID_ANSWER: &str = r#"{
    "summary": "Neustoyka qonundagi chegaradan yuqori",
    "issues": [
        {
            "issue_type": "unlawful_clause",
            "severity": "high",
            "title": "Penya chegarasi",
            "description": "Penya 50% dan oshmasligi kerak",
            "law_name": "Fuqarolik kodeksi",
            "article": "327",
            "suggestion": "Penyani 50% gacha kamaytiring"
        },
        {
            "issue_type": "one_sided",
            "severity": "medium",
            "title": "Bir tomonlama javobgarlik",
            "description": "Faqat buyurtmachi javobgar"
        }
    ]
}"#;

/// Three issues, the second without a severity
const PARTIAL_ANSWER: &str = r#"[
    {"issue_type": "ambiguous_term", "severity": "low", "title": "A", "description": "a"},
    {"issue_type": "ambiguous_term", "title": "B", "description": "b"},
    {"issue_type": "one_sided", "severity": "medium", "title": "C", "description": "c"}
]"#;

fn corpus() -> LawCorpus {
    let article = |number: &str, title: &str, content: &str| LawArticle {
        id: None,
        law_name: "Fuqarolik kodeksi".to_string(),
        short_name: "FK".to_string(),
        article_number: number.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        keywords: vec!["penya".to_string(), "неустойка".to_string()],
    };
    LawCorpus::from_articles(
        vec![
            article("327", "Penya", "Penya miqdori shartnoma summasining ellik foizidan oshmasligi kerak"),
            article("333", "Fors-major", "Yengib bo'lmaydigan kuch holatlari"),
        ],
        HashingEmbeddingModel::new(256),
    )
    .unwrap()
}

fn fast_rag() -> RagConfig {
    RagConfig {
        backoff_base_ms: 1,
        request_timeout_ms: 2_000,
        retrieval_timeout_ms: 2_000,
        ..RagConfig::default()
    }
}

fn pipeline(config: PipelineConfig) -> Pipeline {
    let extractor = TextExtractor::new(config.ocr.clone());
    Pipeline::new(config, extractor).unwrap()
}

fn reviewed_pipeline(config: PipelineConfig, llm: MockProvider) -> Pipeline {
    let analyzer = RagOrchestrator::new(llm, corpus(), config.rag.clone()).unwrap();
    pipeline(config).with_analyzer(Arc::new(analyzer))
}

fn rag_config(rag: RagConfig) -> PipelineConfig {
    PipelineConfig {
        rag,
        ..PipelineConfig::default()
    }
}

fn docx_request(text: &str) -> AnalysisRequest {
    let paragraphs: Vec<&str> = text.lines().collect();
    AnalysisRequest::new(Document::new(
        ContainerKind::Docx,
        docx_fixture(&paragraphs, Some(3)),
    ))
}

fn text_request(text: &str) -> AnalysisRequest {
    AnalysisRequest::new(Document::new(ContainerKind::PlainText, text.as_bytes().to_vec()))
}

fn of_type(result: &AnalysisResult, issue_type: IssueType) -> Vec<&ComplianceIssue> {
    result.issues.iter().filter(|i| i.issue_type == issue_type).collect()
}

struct UnreachableRetriever;

#[async_trait]
impl PassageRetriever for UnreachableRetriever {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<RetrievedPassage>, CollaboratorError> {
        Err(CollaboratorError::Unavailable("connection refused".to_string()))
    }
}

/// Reviewer that never answers in time
struct StuckAnalyzer;

#[async_trait]
impl SectionAnalyzer for StuckAnalyzer {
    fn wants(&self, _label: SectionLabel, _text: &str) -> bool {
        true
    }

    async fn analyze(&self, request: SectionRequest) -> SectionReview {
        tokio::time::sleep(Duration::from_secs(60)).await;
        SectionReview {
            index: request.index,
            ..SectionReview::default()
        }
    }
}

#[tokio::test]
async fn test_docx_contract_with_missing_liability_and_excessive_penalty() {
    let pipeline = reviewed_pipeline(rag_config(fast_rag()), MockProvider::new(VALID_ANSWER));
    let request = docx_request(RU_CONTRACT).with_type(ContractType::Service);

    let result = pipeline.analyze(&request).await;

    assert_eq!(result.status, AnalysisStatus::Completed, "{:?}", result.error);
    assert!(!result.is_scanned);
    assert_eq!(result.language, Some(Language::Ru));
    assert_eq!(result.contract_type, ContractType::Service);

    let missing = of_type(&result, IssueType::MissingMandatorySection);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].severity, Severity::High);

    // The model restates the penalty finding; only the rule's copy is kept
    let unlawful = of_type(&result, IssueType::UnlawfulClause);
    assert_eq!(unlawful.len(), 1);
    assert_eq!(unlawful[0].severity, Severity::High);
    assert_eq!(unlawful[0].source, IssueSource::Rules);
    assert_eq!(unlawful[0].citation.as_ref().unwrap().article, "327");

    assert!(result
        .issues
        .iter()
        .any(|i| i.issue_type == IssueType::OneSided && i.source == IssueSource::Llm));
    assert!(result.risk_score < 50, "risk score {}", result.risk_score);
    assert!(!result.has_warning(WarningCode::LlmUnavailable));

    for pair in result.issues.windows(2) {
        assert!(pair[0].severity >= pair[1].severity);
    }
    let price = result
        .sections
        .iter()
        .find(|s| s.section.label == SectionLabel::Price)
        .unwrap();
    assert!(price.risk >= Some(Severity::High));

    assert!(result.summary.starts_with("Shartnoma tahlili yakunlandi."));
    assert!(result.summary.contains("Til: Rus"));
    assert!(result.summary.contains("Neustoyka qonundagi chegaradan yuqori"));
    assert!(!result.recommendations.is_empty());
}

#[tokio::test]
async fn test_malformed_model_answer_keeps_valid_issues() {
    let rag = RagConfig {
        eligible_labels: vec![SectionLabel::Price],
        ..fast_rag()
    };
    let pipeline = reviewed_pipeline(rag_config(rag), MockProvider::new(PARTIAL_ANSWER));

    let result = pipeline.analyze(&docx_request(RU_CONTRACT)).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    let titles: Vec<&str> = result
        .issues
        .iter()
        .filter(|i| i.source == IssueSource::Llm)
        .map(|i| i.title.as_str())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"A"));
    assert!(titles.contains(&"C"));
    assert!(result.has_warning(WarningCode::LlmSchemaViolation));
}

#[tokio::test]
async fn test_unreachable_model_falls_back_to_rules() {
    let rag = RagConfig {
        request_timeout_ms: 10,
        max_retries: 1,
        ..fast_rag()
    };
    let config = rag_config(rag);
    let llm = MockProvider::new(VALID_ANSWER).with_delay(Duration::from_millis(500));
    let analyzer = RagOrchestrator::new(llm, UnreachableRetriever, config.rag.clone()).unwrap();
    let pipeline = pipeline(config).with_analyzer(Arc::new(analyzer));

    let result = pipeline.analyze(&docx_request(RU_CONTRACT)).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert!(result.has_warning(WarningCode::LlmUnavailable));
    assert!(result.is_degraded());
    assert!(result.issues.iter().all(|i| i.source != IssueSource::Llm));
    assert_eq!(of_type(&result, IssueType::MissingMandatorySection).len(), 1);
    assert!(result.summary.contains("Sun'iy intellekt tahlili: llm_unavailable"));
}

#[tokio::test]
async fn test_scanned_pdf_over_page_limit() {
    let config = PipelineConfig {
        ocr: OcrConfig {
            pages_max: 3,
            ..OcrConfig::default()
        },
        ..PipelineConfig::offline()
    };
    let rasterizer = MockRasterizer::new((1..=5).map(|i| format!("{}-sahifa: shartnoma matni davom etadi", i)));
    let recognizer = MockRecognizer::new("primary", 0.8);
    let engine = OcrEngine::new(config.ocr.clone(), Arc::new(recognizer.clone()), Arc::new(rasterizer));
    let extractor = TextExtractor::new(config.ocr.clone()).with_ocr(engine);
    let pipeline = Pipeline::new(config, extractor).unwrap();

    let request = AnalysisRequest::new(Document::new(ContainerKind::Pdf, blank_pdf_fixture(5)));
    let result = pipeline.analyze(&request).await;

    assert_eq!(result.status, AnalysisStatus::Completed, "{:?}", result.error);
    assert!(result.is_scanned);
    assert!(result.has_warning(WarningCode::Truncated));
    assert_eq!(recognizer.calls().len(), 3);
    assert!((result.ocr_confidence.unwrap() - 0.8).abs() < 1e-4);
}

#[tokio::test]
async fn test_corrupt_document_fails() {
    let pipeline = pipeline(PipelineConfig::default());
    let request = AnalysisRequest::new(Document::new(ContainerKind::Pdf, vec![0x13, 0x37, 0x00, 0xFF]));

    let result = pipeline.analyze(&request).await;

    assert_eq!(result.status, AnalysisStatus::Failed);
    assert!(result.error.as_deref().unwrap().contains("corrupt_document"));
    assert!(result.issues.is_empty());
}

#[tokio::test]
async fn test_scan_without_ocr_engine_fails_as_empty() {
    let pipeline = pipeline(PipelineConfig::default());
    let request = AnalysisRequest::new(Document::new(ContainerKind::Pdf, blank_pdf_fixture(2)));

    let result = pipeline.analyze(&request).await;

    assert_eq!(result.status, AnalysisStatus::Failed);
    assert!(result.error.as_deref().unwrap().contains("empty_text"));
    assert!(result.has_warning(WarningCode::StageSkipped));
}

#[tokio::test]
async fn test_cancel_before_start_fails() {
    let pipeline = pipeline(PipelineConfig::default());
    let cancel = CancelSignal::new();
    cancel.cancel();

    let result = pipeline.analyze_with_cancel(&docx_request(RU_CONTRACT), &cancel).await;

    assert_eq!(result.status, AnalysisStatus::Failed);
    assert!(result.error.as_deref().unwrap().contains("cancelled"));
}

#[tokio::test]
async fn test_cancel_during_review_completes_with_rules() {
    let pipeline = pipeline(PipelineConfig::default()).with_analyzer(Arc::new(StuckAnalyzer));
    let cancel = CancelSignal::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        pipeline.analyze_with_cancel(&docx_request(RU_CONTRACT), &cancel),
    )
    .await
    .unwrap();

    assert_eq!(result.status, AnalysisStatus::Completed);
    let cancelled = result
        .warnings
        .iter()
        .find(|w| w.code == WarningCode::Cancelled)
        .unwrap();
    assert_eq!(cancelled.stage, Stage::Rag);
    assert!(cancelled.message.contains("abandoned"));
    assert_eq!(of_type(&result, IssueType::MissingMandatorySection).len(), 1);
}

#[tokio::test]
async fn test_hard_budget_stops_waiting_for_reviews() {
    let config = PipelineConfig {
        soft_budget_ms: 100,
        hard_budget_ms: 300,
        ..PipelineConfig::default()
    };
    let pipeline = pipeline(config).with_analyzer(Arc::new(StuckAnalyzer));

    let result = tokio::time::timeout(Duration::from_secs(10), pipeline.analyze(&docx_request(RU_CONTRACT)))
        .await
        .unwrap();

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert!(result.has_warning(WarningCode::HardBudgetExceeded));
    assert!(result.has_warning(WarningCode::SoftBudgetExceeded));
    assert!(result.duration_ms >= 300);
    assert!(result.risk_score < 50);
}

#[tokio::test]
async fn test_soft_budget_only_warns() {
    let config = PipelineConfig {
        soft_budget_ms: 0,
        ..PipelineConfig::default()
    };
    let result = pipeline(config).analyze(&docx_request(RU_CONTRACT)).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    let soft: Vec<_> = result
        .warnings
        .iter()
        .filter(|w| w.code == WarningCode::SoftBudgetExceeded)
        .collect();
    assert_eq!(soft.len(), 1);
    assert!(!result.is_degraded());
}

#[tokio::test]
async fn test_spelling_issues_for_uzbek_text() {
    let checker = MockSpellChecker::new().with_misspelling("shartnmani", &["shartnomani"]);
    let pipeline = pipeline(PipelineConfig::default()).with_spell_checker(Arc::new(checker.clone()));

    let result = pipeline.analyze(&text_request(UZ_CONTRACT)).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert_eq!(result.language, Some(Language::UzLatin));
    assert_eq!(checker.calls(), vec![Script::Latin]);

    let spelling = of_type(&result, IssueType::Spelling);
    assert_eq!(spelling.len(), 1);
    assert_eq!(spelling[0].severity, Severity::Low);
    assert_eq!(spelling[0].suggestion.as_deref(), Some("To'g'ri yozilishi: shartnomani"));
}

#[tokio::test]
async fn test_spelling_service_down_is_a_warning() {
    let pipeline = pipeline(PipelineConfig::default()).with_spell_checker(Arc::new(MockSpellChecker::unavailable()));

    let result = pipeline.analyze(&text_request(UZ_CONTRACT)).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert!(result.has_warning(WarningCode::SpellingUnavailable));
    assert!(of_type(&result, IssueType::Spelling).is_empty());
}

#[tokio::test]
async fn test_russian_text_uses_its_own_checker() {
    let uzbek = MockSpellChecker::new();
    let russian = MockSpellChecker::new().with_misspelling("помещений", &["помещений"]);
    let pipeline = pipeline(PipelineConfig::default())
        .with_spell_checker(Arc::new(uzbek.clone()))
        .with_russian_spell_checker(Arc::new(russian.clone()));

    let result = pipeline.analyze(&docx_request(RU_CONTRACT)).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert!(uzbek.calls().is_empty());
    assert_eq!(russian.calls(), vec![Script::Cyrillic]);
    assert_eq!(of_type(&result, IssueType::Spelling).len(), 1);
    assert!(!result.has_warning(WarningCode::SpellingUnavailable));
}

#[tokio::test]
async fn test_local_rules_run_without_services() {
    let text = RU_CONTRACT.replace("оказывает услуги", "оказывает услуги, даговор");
    let result = pipeline(PipelineConfig::default()).analyze(&docx_request(&text)).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    let spelling = of_type(&result, IssueType::Spelling);
    assert_eq!(spelling.len(), 1);
    assert_eq!(spelling[0].suggestion.as_deref(), Some("To'g'ri yozilishi: договор"));
}

#[tokio::test]
async fn test_local_rules_merge_with_service() {
    let text = UZ_CONTRACT.replace("ko'rsatadi", "ko`rsatadi").replace("12.03.2024", "12.03.2024, Shartnomа");
    let checker = MockSpellChecker::new()
        .with_misspelling("shartnmani", &["shartnomani"])
        .with_misspelling("ko`rsatadi", &["ko'rsatadi"])
        .with_misspelling("ijrochi", &["ijrochisi"]);
    let pipeline = pipeline(PipelineConfig::default()).with_spell_checker(Arc::new(checker));

    let result = pipeline.analyze(&text_request(&text)).await;

    let words: Vec<&str> = of_type(&result, IssueType::Spelling)
        .iter()
        .filter_map(|i| i.title.strip_prefix("Imloviy xato: "))
        .collect();
    assert_eq!(words, vec!["Shartnomа", "shartnmani", "ko`rsatadi"]);
}

#[tokio::test]
async fn test_non_contract_gets_short_answer() {
    let llm = MockProvider::new(VALID_ANSWER);
    let calls_seen = llm.clone();
    let pipeline = reviewed_pipeline(rag_config(fast_rag()), llm);

    let result = pipeline
        .analyze(&text_request("Bugun havo yaxshi. Ertaga yomg'ir yog'adi, shamol esadi."))
        .await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert!(result.has_warning(WarningCode::NotAContract));
    assert_eq!(result.risk_score, 0);
    assert_eq!(calls_seen.call_count(), 0);
    assert_eq!(result.recommendations, NOT_A_CONTRACT_RECOMMENDATIONS.to_vec());
    assert!(result.summary.starts_with("Yuklangan hujjat shartnoma emas"));
}

#[tokio::test]
async fn test_disabled_stages_are_skipped() {
    let mut config = PipelineConfig::default();
    config.stages.compliance = false;
    let result = pipeline(config).analyze(&docx_request(RU_CONTRACT)).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert!(result.issues.is_empty());
    assert_eq!(result.risk_score, 100);
}

#[tokio::test]
async fn test_repeated_runs_are_independent() {
    let pipeline = pipeline(PipelineConfig::default());
    let request = docx_request(RU_CONTRACT);

    let first = pipeline.analyze(&request).await;
    let second = pipeline.analyze(&request).await;

    assert_ne!(first.id, second.id);
    assert_eq!(first.document_id, second.document_id);
    assert_eq!(first.risk_score, second.risk_score);
    assert_eq!(first.issues, second.issues);
    assert_eq!(first.summary, second.summary);

    let metrics = pipeline.metrics();
    assert_eq!(metrics.completed, 2);
    assert!(metrics.stage_ms.contains_key(&Stage::Segmentation));
    assert!(metrics.stage_ms.contains_key(&Stage::Assembly));
}

#[tokio::test]
async fn test_result_serializes() {
    let result = pipeline(PipelineConfig::default()).analyze(&docx_request(RU_CONTRACT)).await;
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "completed");
    assert!(json["issues"].as_array().is_some_and(|issues| !issues.is_empty()));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = PipelineConfig {
        soft_budget_ms: 10,
        hard_budget_ms: 5,
        ..PipelineConfig::default()
    };
    let result = Pipeline::new(config.clone(), TextExtractor::new(config.ocr));
    assert!(matches!(result, Err(crate::PipelineError::Config(_))));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: every plain-text input ends in a terminal state, failing only when blank
    #[test]
    fn test_any_text_reaches_terminal_state(text in "\\PC{0,200}") {
        let pipeline = pipeline(PipelineConfig::offline());
        let result = tokio_test::block_on(pipeline.analyze(&text_request(&text)));

        let blank = text.chars().all(char::is_whitespace);
        prop_assert_eq!(result.status == AnalysisStatus::Failed, blank);
        prop_assert!(result.risk_score <= 100);
        for pair in result.issues.windows(2) {
            prop_assert!(pair[0].severity >= pair[1].severity);
        }
    }
}
