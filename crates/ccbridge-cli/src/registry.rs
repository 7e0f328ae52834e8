//! Declarative table of engine operations.
//!
//! Each entry pairs an operation name with its input schema and a handler
//! that decodes the JSON input, calls the engine and encodes the result.

use ccbridge_core::backup::ValidateRequest;
use ccbridge_core::{
    BackupRequest, CancellationToken, CompareRequest, Engine, MigrateRequest, RollbackRequest,
};
use futures::future::{FutureExt, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{CliError, Result};

/// Handler of one operation.
pub type Handler =
    for<'a> fn(&'a Engine, Value, &'a CancellationToken) -> LocalBoxFuture<'a, Result<Value>>;

/// A registered operation.
pub struct OperationSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> Value,
    pub handler: Handler,
}

impl OperationSpec {
    /// Name, description and schema as JSON.
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": (self.input_schema)(),
        })
    }
}

/// Every operation the binary exposes.
pub static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: "migrate",
        description: "Migrate one entity type from a source organization to a target environment",
        input_schema: migrate_schema,
        handler: migrate,
    },
    OperationSpec {
        name: "compare",
        description: "Reconcile source entities against a target environment",
        input_schema: compare_schema,
        handler: compare,
    },
    OperationSpec {
        name: "createBackup",
        description: "Snapshot target components before a migration",
        input_schema: create_backup_schema,
        handler: create_backup,
    },
    OperationSpec {
        name: "validateBackupIntegrity",
        description: "Check a stored backup before relying on it",
        input_schema: validate_schema,
        handler: validate_backup_integrity,
    },
    OperationSpec {
        name: "rollback",
        description: "Restore target components from a backup",
        input_schema: rollback_schema,
        handler: rollback,
    },
    OperationSpec {
        name: "rollbackStatus",
        description: "Show the stored state of a rollback run",
        input_schema: rollback_ref_schema,
        handler: rollback_status,
    },
    OperationSpec {
        name: "resumeRollback",
        description: "Continue a failed or interrupted rollback run",
        input_schema: rollback_ref_schema,
        handler: resume_rollback,
    },
];

/// Look up an operation by name.
pub fn find(name: &str) -> Option<&'static OperationSpec> {
    OPERATIONS.iter().find(|op| op.name == name)
}

/// Run a named operation.
pub async fn invoke(
    engine: &Engine,
    name: &str,
    input: Value,
    cancel: &CancellationToken,
) -> Result<Value> {
    let spec = find(name).ok_or_else(|| CliError::UnknownOperation(name.to_string()))?;
    (spec.handler)(engine, input, cancel).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RollbackRef {
    rollback_id: String,
}

fn decode<T: DeserializeOwned>(input: Value) -> Result<T> {
    Ok(serde_json::from_value(input)?)
}

fn encode<T: Serialize>(output: &T) -> Result<Value> {
    Ok(serde_json::to_value(output)?)
}

fn migrate<'a>(
    engine: &'a Engine,
    input: Value,
    cancel: &'a CancellationToken,
) -> LocalBoxFuture<'a, Result<Value>> {
    async move {
        let req: MigrateRequest = decode(input)?;
        encode(&engine.migrate(&req, cancel).await?)
    }
    .boxed_local()
}

fn compare<'a>(
    engine: &'a Engine,
    input: Value,
    cancel: &'a CancellationToken,
) -> LocalBoxFuture<'a, Result<Value>> {
    async move {
        let req: CompareRequest = decode(input)?;
        encode(&engine.compare(&req, cancel).await?)
    }
    .boxed_local()
}

fn create_backup<'a>(
    engine: &'a Engine,
    input: Value,
    cancel: &'a CancellationToken,
) -> LocalBoxFuture<'a, Result<Value>> {
    async move {
        let req: BackupRequest = decode(input)?;
        encode(&engine.create_backup(&req, cancel).await?)
    }
    .boxed_local()
}

fn validate_backup_integrity<'a>(
    engine: &'a Engine,
    input: Value,
    cancel: &'a CancellationToken,
) -> LocalBoxFuture<'a, Result<Value>> {
    async move {
        let req: ValidateRequest = decode(input)?;
        encode(&engine.validate_backup_integrity(&req, cancel).await?)
    }
    .boxed_local()
}

fn rollback<'a>(
    engine: &'a Engine,
    input: Value,
    cancel: &'a CancellationToken,
) -> LocalBoxFuture<'a, Result<Value>> {
    async move {
        let req: RollbackRequest = decode(input)?;
        encode(&engine.rollback(&req, cancel).await?)
    }
    .boxed_local()
}

fn rollback_status<'a>(
    engine: &'a Engine,
    input: Value,
    _cancel: &'a CancellationToken,
) -> LocalBoxFuture<'a, Result<Value>> {
    async move {
        let req: RollbackRef = decode(input)?;
        encode(&engine.rollback_status(&req.rollback_id)?)
    }
    .boxed_local()
}

fn resume_rollback<'a>(
    engine: &'a Engine,
    input: Value,
    cancel: &'a CancellationToken,
) -> LocalBoxFuture<'a, Result<Value>> {
    async move {
        let req: RollbackRef = decode(input)?;
        encode(&engine.resume_rollback(&req.rollback_id, cancel).await?)
    }
    .boxed_local()
}

const ENTITY_TYPES: [&str; 5] = ["user", "queue", "flow", "skill", "bot"];
const COMPONENTS: [&str; 4] = ["Users", "Queues", "Flows", "Bots"];

fn migrate_schema() -> Value {
    json!({
        "type": "object",
        "required": ["entityType", "sourceOrgRef", "targetEnvRef"],
        "properties": {
            "entityType": { "type": "string", "enum": ENTITY_TYPES },
            "sourceOrgRef": { "type": "string" },
            "targetEnvRef": { "type": "string" },
            "idFilter": { "type": "array", "items": { "type": "string" } },
            "dryRun": { "type": "boolean", "default": false },
            "includeAssociations": { "type": "boolean", "default": false },
            "flowArtifacts": {
                "type": "object",
                "properties": {
                    "includeVariables": { "type": "boolean" },
                    "includeRoutingRules": { "type": "boolean" }
                }
            }
        }
    })
}

fn compare_schema() -> Value {
    json!({
        "type": "object",
        "required": ["entityType", "sourceOrgRef", "targetEnvRef"],
        "properties": {
            "entityType": { "type": "string", "enum": ENTITY_TYPES },
            "sourceOrgRef": { "type": "string" },
            "targetEnvRef": { "type": "string" },
            "idFilter": { "type": "array", "items": { "type": "string" } },
            "includeAssociations": { "type": "boolean", "default": false },
            "showOnlyDifferences": { "type": "boolean", "default": false }
        }
    })
}

fn create_backup_schema() -> Value {
    json!({
        "type": "object",
        "required": ["migrationId", "sourceOrgRef", "targetEnvRef", "components"],
        "properties": {
            "migrationId": { "type": "string" },
            "sourceOrgRef": { "type": "string" },
            "targetEnvRef": { "type": "string" },
            "components": { "type": "array", "items": { "type": "string", "enum": COMPONENTS } },
            "compressionLevel": { "type": "string", "enum": ["low", "medium", "high"] }
        }
    })
}

fn validate_schema() -> Value {
    json!({
        "type": "object",
        "required": ["backupId", "migrationId"],
        "properties": {
            "backupId": { "type": "string" },
            "migrationId": { "type": "string" },
            "checks": {
                "type": "object",
                "properties": {
                    "checksum": { "type": "boolean", "default": true },
                    "structure": { "type": "boolean", "default": true },
                    "testRestore": { "type": "boolean", "default": false }
                }
            }
        }
    })
}

fn rollback_schema() -> Value {
    json!({
        "type": "object",
        "required": ["backupId", "targetEnvRef"],
        "properties": {
            "rollbackId": { "type": "string" },
            "backupId": { "type": "string" },
            "targetEnvRef": { "type": "string" },
            "scope": { "type": "string", "enum": ["full", "partial"], "default": "full" },
            "components": { "type": "array", "items": { "type": "string", "enum": COMPONENTS } },
            "dryRun": { "type": "boolean", "default": false }
        }
    })
}

fn rollback_ref_schema() -> Value {
    json!({
        "type": "object",
        "required": ["rollbackId"],
        "properties": {
            "rollbackId": { "type": "string" }
        }
    })
}
