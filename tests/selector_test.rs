//! Model → provider selection with the default prefix table.

use colloquy::{ColloquyError, CredentialSet, ProviderKind, ProviderSelector, TextProvider};

fn all_keys() -> CredentialSet {
    CredentialSet::new()
        .with(ProviderKind::Anthropic, "sk-ant")
        .with(ProviderKind::OpenAi, "sk-oa")
}

#[test]
fn claude_models_go_to_anthropic() {
    let selector = ProviderSelector::with_defaults();
    let provider = selector
        .select("claude-3-haiku-20240307", &all_keys())
        .unwrap();

    assert_eq!(provider.kind(), ProviderKind::Anthropic);
    assert_eq!(provider.name(), "anthropic");
    assert_eq!(provider.model(), "claude-3-haiku-20240307");
}

#[test]
fn gpt_models_go_to_openai() {
    let selector = ProviderSelector::with_defaults();
    let provider = selector.select("gpt-4o-mini", &all_keys()).unwrap();

    assert_eq!(provider.name(), "openai");
    assert_eq!(provider.model(), "gpt-4o-mini");
}

#[test]
fn missing_key_names_the_provider() {
    let selector = ProviderSelector::with_defaults();
    let only_openai = CredentialSet::new().with(ProviderKind::OpenAi, "sk-oa");
    let only_anthropic = CredentialSet::new().with(ProviderKind::Anthropic, "sk-ant");

    let err = selector.select("claude-3-opus", &only_openai).err().unwrap();
    assert!(matches!(
        err,
        ColloquyError::MissingCredential {
            provider: ProviderKind::Anthropic
        }
    ));
    assert_eq!(
        err.to_string(),
        "Anthropic API key is required for Claude models"
    );

    let err = selector.select("gpt-4", &only_anthropic).err().unwrap();
    assert!(matches!(
        err,
        ColloquyError::MissingCredential {
            provider: ProviderKind::OpenAi
        }
    ));
}

#[test]
fn empty_key_counts_as_missing() {
    let selector = ProviderSelector::with_defaults();
    let creds = CredentialSet::new().with(ProviderKind::Anthropic, "");

    assert!(matches!(
        selector.select("claude-3-opus", &creds).err(),
        Some(ColloquyError::MissingCredential { .. })
    ));
}

#[test]
fn unknown_prefix_is_unsupported_even_without_keys() {
    let selector = ProviderSelector::with_defaults();

    for model in ["gemini-pro", "Claude-3-opus", "claude", "gpt", ""] {
        assert!(
            matches!(
                selector.select(model, &CredentialSet::new()).err(),
                Some(ColloquyError::UnsupportedModel(ref m)) if m == model
            ),
            "expected {model:?} to be unsupported"
        );
        assert!(selector.select(model, &all_keys()).is_err());
    }
}

#[test]
fn default_table_has_two_prefixes() {
    let selector = ProviderSelector::with_defaults();
    let mut prefixes: Vec<&str> = selector.prefixes().collect();
    prefixes.sort_unstable();
    assert_eq!(prefixes, ["claude-", "gpt-"]);
    assert_eq!(selector.timeout_secs(), 120);
}
