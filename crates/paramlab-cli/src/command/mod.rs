//! One-shot commands that print JSON to stdout and exit.

use std::collections::BTreeMap;
use std::io::{self, Write};

use paramlab_core::param::Stage;
use paramlab_core::{ConfigResolver, ModelDescriptor, ModelRole};
use serde::Serialize;
use serde_json::{Value, json};
use strum::IntoEnumIterator;

use crate::TRACING_TARGET_CONFIG;
use crate::config::{ModelsArgs, ResolveArgs, ValidateArgs};

/// Summary of a successful `validate` run.
///
/// Inconsistent overrides are only logged unless `args.strict` is set, in
/// which case they fail the command.
pub fn validate(resolver: &ConfigResolver, args: &ValidateArgs) -> anyhow::Result<Value> {
    let snapshot = resolver.snapshot();
    let mut issues = 0;
    for task in resolver.registry().tasks() {
        issues += resolver.resolve_task(task)?.issue_count();
    }

    if issues > 0 {
        tracing::warn!(
            target: TRACING_TARGET_CONFIG,
            issues,
            "resolved parameters are inconsistent with their bounds or options"
        );
        if args.strict {
            anyhow::bail!("{issues} resolved parameters are inconsistent with their bounds or options");
        }
    }

    Ok(json!({
        "parameters": Stage::iter().map(|stage| snapshot.catalog().all(stage).len()).sum::<usize>(),
        "overridden_tasks": snapshot.overrides().tasks().count(),
        "tasks": resolver.registry().len(),
        "models": resolver.models().len(),
        "documented": snapshot.documentation().len(),
        "issues": issues,
    }))
}

/// Resolves a task, one stage of it, or a single parameter.
pub fn resolve(resolver: &ConfigResolver, args: &ResolveArgs) -> anyhow::Result<Value> {
    let Some(stage) = args.stage.as_deref() else {
        return Ok(serde_json::to_value(resolver.resolve_task(&args.task)?)?);
    };

    let stage = Stage::parse(stage)?;
    let value = match args.parameter.as_deref() {
        Some(parameter) => {
            serde_json::to_value(resolver.resolve_parameter(&args.task, stage, parameter)?)?
        }
        None => serde_json::to_value(resolver.resolve(&args.task, stage)?)?,
    };
    Ok(value)
}

pub fn tasks(resolver: &ConfigResolver) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(resolver.registry().descriptors())?)
}

/// Lists models grouped by role, or the models of `args.role`.
pub fn models(resolver: &ConfigResolver, args: &ModelsArgs) -> anyhow::Result<Value> {
    let catalog = resolver.models();
    if let Some(role) = args.role.as_deref() {
        let role = ModelRole::parse(role)?;
        return Ok(serde_json::to_value(catalog.by_role(role))?);
    }

    let grouped: BTreeMap<ModelRole, &[ModelDescriptor]> = ModelRole::iter()
        .map(|role| (role, catalog.by_role(role)))
        .collect();
    Ok(serde_json::to_value(grouped)?)
}

/// Writes `value` as pretty JSON followed by a newline.
pub fn print(value: &impl Serialize) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
