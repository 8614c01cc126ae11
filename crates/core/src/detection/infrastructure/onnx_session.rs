use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::Session;

/// Opens an ONNX model with the platform's preferred execution providers.
///
/// Every oracle in the counter (person, face, gender) loads through here so
/// they share one provider policy.
pub fn load_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    if !model_path.is_file() {
        return Err(format!("Model file not found: {}", model_path.display()).into());
    }
    let session = Session::builder()?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;
    log::debug!(
        "Loaded {} ({} input(s), {} output(s))",
        model_path.display(),
        session.inputs().len(),
        session.outputs().len()
    );
    Ok(session)
}

/// CoreML on macOS, DirectML on Windows, CPU elsewhere. ort falls back to
/// CPU when a listed provider is unavailable.
fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_error() {
        match load_session(Path::new("/nonexistent/model.onnx")) {
            Ok(_) => panic!("expected an error"),
            Err(e) => assert!(e.to_string().contains("Model file not found")),
        }
    }
}
