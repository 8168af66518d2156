//! Analyze command implementation.

use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use shartnoma_domain::{AnalysisRequest, AnalysisStatus, ContainerKind, Document};
use shartnoma_extract::TextExtractor;
use shartnoma_llm::{FallbackProvider, OllamaProvider, OpenAiProvider};
use shartnoma_pipeline::{CancelSignal, HttpSpellChecker, LanguageToolChecker, Pipeline};
use shartnoma_rag::{RagOrchestrator, SectionAnalyzer};
use shartnoma_store::embedding::HashingEmbeddingModel;
use shartnoma_store::{LawCorpus, LawStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Execute the analyze command.
pub async fn execute_analyze(args: AnalyzeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let request = load_request(&args)?;
    let pipeline = build_pipeline(config, args.offline)?;

    let cancel = CancelSignal::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with partial results");
            on_interrupt.cancel();
        }
    });

    let result = pipeline.analyze_with_cancel(&request, &cancel).await;
    watcher.abort();

    println!("{}", formatter.format_analysis(&result)?);

    if result.status == AnalysisStatus::Failed {
        return Err(CliError::AnalysisFailed(
            result.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    Ok(())
}

/// Read the file and wrap it in a request with the declared hints.
pub(crate) fn load_request(args: &AnalyzeArgs) -> Result<AnalysisRequest> {
    let document = load_document(&args.file)?;
    let mut request = AnalysisRequest::new(document).with_title(file_title(&args.file));
    if let Some(contract_type) = args.contract_type {
        request = request.with_type(contract_type.into());
    }
    if let Some(language) = args.language {
        request = request.with_language(language.into());
    }
    Ok(request)
}

/// Read a document, taking the container kind from the extension.
pub(crate) fn load_document(file: &str) -> Result<Document> {
    let path = Path::new(file);
    let kind = ContainerKind::from_path(path).ok_or_else(|| {
        CliError::InvalidInput(format!(
            "Unsupported file '{}'. Expected .docx, .doc, .pdf, .txt or an image",
            file
        ))
    })?;
    let bytes = std::fs::read(path)?;
    Ok(Document::new(kind, bytes))
}

fn file_title(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

fn build_pipeline(config: &Config, offline: bool) -> Result<Pipeline> {
    let mut pipeline_config = config.pipeline.clone();
    if offline {
        pipeline_config.stages.rag = false;
    }

    let extractor = TextExtractor::system(pipeline_config.ocr.clone());
    let mut pipeline = Pipeline::new(pipeline_config.clone(), extractor)?;

    // Local spelling rules run regardless; offline runs skip the services
    if pipeline_config.stages.spelling && !offline {
        let spelling = &pipeline_config.spelling;
        pipeline = pipeline.with_spell_checker(Arc::new(HttpSpellChecker::new(spelling)));
        if let Some(endpoint) = &spelling.russian_endpoint {
            pipeline = pipeline.with_russian_spell_checker(Arc::new(LanguageToolChecker::new(endpoint, spelling)));
        }
    }

    if pipeline_config.stages.rag {
        match build_analyzer(config)? {
            Some(analyzer) => pipeline = pipeline.with_analyzer(analyzer),
            None => warn!("Statute store is empty, model review disabled; run `shartnoma laws import` first"),
        }
    }

    Ok(pipeline)
}

fn build_analyzer(config: &Config) -> Result<Option<Arc<dyn SectionAnalyzer>>> {
    let store = LawStore::new(config.store_path()?)?;
    let corpus = LawCorpus::build(&store, HashingEmbeddingModel::new(config.store.embedding_dimension))?;
    if corpus.is_empty() {
        return Ok(None);
    }
    info!(articles = corpus.len(), "Statute corpus indexed");

    let rag = config.pipeline.rag.clone();
    let ollama = OllamaProvider::new(&config.llm.endpoint, &config.llm.model);
    let fallback = if config.llm.openai_fallback {
        OpenAiProvider::from_env()
    } else {
        None
    };

    let analyzer: Arc<dyn SectionAnalyzer> = match fallback {
        Some(openai) => {
            info!(model = %config.llm.model, "Using Ollama with OpenAI fallback");
            Arc::new(RagOrchestrator::new(FallbackProvider::new(ollama, openai), corpus, rag)?)
        }
        None => {
            info!(model = %config.llm.model, "Using Ollama");
            Arc::new(RagOrchestrator::new(ollama, corpus, rag)?)
        }
    };
    Ok(Some(analyzer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ContractTypeArg, LanguageArg};
    use shartnoma_domain::{ContractType, Language};

    fn args(file: &str) -> AnalyzeArgs {
        AnalyzeArgs {
            file: file.to_string(),
            contract_type: Some(ContractTypeArg::Supply),
            language: Some(LanguageArg::Ru),
            offline: true,
        }
    }

    #[test]
    fn test_load_request_applies_hints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postavka.txt");
        std::fs::write(&path, "ДОГОВОР ПОСТАВКИ").unwrap();

        let request = load_request(&args(path.to_str().unwrap())).unwrap();
        assert_eq!(request.document.kind, ContainerKind::PlainText);
        assert_eq!(request.declared_type, Some(ContractType::Supply));
        assert_eq!(request.declared_language, Some(Language::Ru));
        assert_eq!(request.title.as_deref(), Some("postavka"));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.xyz");
        std::fs::write(&path, "x").unwrap();

        assert!(matches!(
            load_request(&args(path.to_str().unwrap())),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(load_document("/nonexistent/contract.txt"), Err(CliError::Io(_))));
    }

    #[test]
    fn test_offline_pipeline_needs_no_store() {
        let mut config = Config::default();
        config.store.path = Some("/nonexistent/dir/laws.db".into());
        assert!(build_pipeline(&config, true).is_ok());
    }

    #[tokio::test]
    async fn test_offline_analysis_of_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shartnoma.txt");
        std::fs::write(
            &path,
            "XIZMAT KO'RSATISH SHARTNOMASI № 5\n\n1. SHARTNOMA PREDMETI\n1.1. Ijrochi buyurtmachiga xizmat ko'rsatadi.\n\n2. NARX\n2.1. Shartnoma summasi 1 000 000 so'm.\n",
        )
        .unwrap();

        let config = Config::default();
        let pipeline = build_pipeline(&config, true).unwrap();
        let request = load_request(&AnalyzeArgs {
            file: path.to_str().unwrap().to_string(),
            contract_type: None,
            language: None,
            offline: true,
        })
        .unwrap();

        let result = pipeline.analyze(&request).await;
        assert_eq!(result.status, AnalysisStatus::Completed);
        assert!(result.risk_score <= 100);
        assert!(!result
            .warnings
            .iter()
            .any(|w| w.code == shartnoma_domain::WarningCode::SpellingUnavailable));
    }
}
