use console::style;
use geopipes_core::GeopipesError;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for missing dataset
pub fn dataset_not_found(path: &str) -> CliError {
    CliError::new("Dataset file not found")
        .with_context(format!("The specified dataset file does not exist.\n\nPath: {}", path))
        .with_suggestion("Check the file path and try again")
        .with_suggestion("Use absolute path or path relative to current directory")
        .with_help("Run: geopipes layers --help")
}

/// Create error for a layer the dataset does not declare
pub fn layer_not_found(name: &str, available: &[String]) -> CliError {
    let listed = if available.is_empty() { "(none)".to_string() } else { available.join(", ") };
    CliError::new(format!("Layer not found: {}", name))
        .with_context(format!("Layers in this dataset: {}", listed))
        .with_suggestion("List the layers: geopipes layers <DATASET>")
        .with_help("Run: geopipes run --help")
}

/// Create error for a stage name no stage answers to
pub fn unknown_stage(name: &str, similar: &[&str]) -> CliError {
    let mut error = CliError::new(format!("Unknown stage: {}", name))
        .with_context("Stages are given as --stage \"<name> [args...]\".");
    for candidate in similar {
        error = error.with_suggestion(format!("Did you mean '{}'?", candidate));
    }
    error.with_help("Run: geopipes run --help")
}

/// Create error for stage arguments that do not parse
pub fn bad_stage_arguments(stage: &str, usage: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid arguments for {}", stage))
        .with_context(format!("Reason: {}", reason))
        .with_suggestion(format!("Usage: --stage \"{}\"", usage))
}

/// Point at the offending byte of a CQL expression
pub fn cql_syntax(expression: &str, position: usize, reason: &str) -> CliError {
    let column = expression
        .char_indices()
        .take_while(|(offset, _)| *offset < position)
        .count();
    CliError::new("CQL syntax error")
        .with_context(format!("{}\n{}^ {}", expression, " ".repeat(column), reason))
        .with_help("Run: geopipes cql --help")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let error = match error.downcast::<CliError>() {
        Ok(cli_error) => return cli_error,
        Err(error) => error,
    };

    match error.downcast_ref::<GeopipesError>() {
        Some(GeopipesError::CqlSyntax { expression, position, reason }) => {
            cql_syntax(expression, *position, reason)
        }
        Some(GeopipesError::InvalidGeometry { .. }) => CliError::new(format!("{:#}", error))
            .with_suggestion("Repair the geometry")
            .with_suggestion("Or load the dataset with --validity-mode lenient"),
        Some(GeopipesError::ConfigInvalid { key, reason }) => {
            CliError::new(format!("Invalid configuration: {}", key))
                .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
                .with_suggestion("Check geopipes.toml and the GEOPIPES_* environment variables")
                .with_help("Run: geopipes config")
        }
        _ => CliError::new(format!("{:#}", error)),
    }
}
