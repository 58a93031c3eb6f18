use clap::{Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use crate::api::{MutationResponse, Query, UploadFile};
use crate::cli::config::build_client;
use crate::cli::utils::{output_record, output_records, output_success};
use crate::cli::OutputFormat;
use crate::client::CrmClient;
use crate::codec;
use crate::dto::{
    Boat, Company, Entity, Guild, Notice, Person, Procedure, ProcedureStatus, ProcedureType, User,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    Boats,
    Companies,
    Procedures,
    Users,
    People,
    Guilds,
    Notices,
    ProcedureTypes,
    ProcedureStatuses,
}

impl Resource {
    fn collection_name(self) -> &'static str {
        match self {
            Resource::Boats => "boats",
            Resource::Companies => "companies",
            Resource::Procedures => "procedures",
            Resource::Users => "users",
            Resource::People => "people",
            Resource::Guilds => "guilds",
            Resource::Notices => "notices",
            Resource::ProcedureTypes => "procedure_types",
            Resource::ProcedureStatuses => "procedure_statuses",
        }
    }
}

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "Select one record by id, or list records")]
    Select {
        #[arg(value_enum, help = "Resource to query")]
        resource: Resource,
        #[arg(help = "Record ID to retrieve (optional)")]
        id: Option<String>,
        #[arg(long = "filter", value_name = "KEY=VALUE", help = "Query filter, repeatable")]
        filters: Vec<String>,
        #[arg(long = "include", value_delimiter = ',', help = "Related entities to expand")]
        includes: Vec<String>,
        #[arg(long, requires = "id", help = "List the users of one company instead")]
        users: bool,
    },

    #[command(about = "Create record from stdin")]
    Create {
        #[arg(value_enum, help = "Resource to create")]
        resource: Resource,
    },

    #[command(about = "Update record from stdin")]
    Update {
        #[arg(value_enum, help = "Resource to update")]
        resource: Resource,
        #[arg(help = "Record ID to update")]
        id: String,
    },

    #[command(about = "Delete record")]
    Delete {
        #[arg(value_enum, help = "Resource to delete from")]
        resource: Resource,
        #[arg(help = "Record ID to delete")]
        id: String,
    },

    #[command(about = "Upload a file as multipart form data")]
    Upload {
        #[arg(help = "File to upload")]
        path: PathBuf,
        #[arg(long, help = "Upload endpoint, relative to the API base URL")]
        endpoint: String,
        #[arg(long, help = "Form field name (defaults to the configured one)")]
        field: Option<String>,
        #[arg(long, help = "Content type (defaults by file extension)")]
        content_type: Option<String>,
    },
}

enum Action {
    Select { id: Option<String>, query: Query },
    Create(Value),
    Update { id: String, body: Value },
    Delete { id: String },
}

async fn read_stdin_json() -> anyhow::Result<Value> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    if input.trim().is_empty() {
        return Err(anyhow::anyhow!("Expected a JSON record on stdin"));
    }
    Ok(serde_json::from_str(&input)?)
}

fn build_query(filters: Vec<String>, includes: Vec<String>) -> anyhow::Result<Query> {
    let mut query = Query::new();
    for filter in filters {
        let parsed: Query = filter.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        for (key, value) in parsed.filters() {
            query.set(key.clone(), value);
        }
        query = query.includes(parsed.included().iter().cloned());
    }
    Ok(query.includes(includes))
}

fn report<T: Entity>(output_format: &OutputFormat, response: MutationResponse<T>) -> anyhow::Result<()> {
    if !response.success {
        return Err(anyhow::anyhow!(response.message_or_default()));
    }

    let mut data = json!({ "operation": response.outcome.operation().to_string() });
    if let Some(key) = response.key() {
        data["key"] = json!(key);
    }
    if let Some(entity) = response.entity() {
        data["key"] = json!(entity.key());
        data["record"] = codec::encode(entity)?;
    }
    output_success(output_format, &response.message_or_default(), Some(data))
}

async fn perform<T: Entity>(
    client: &CrmClient,
    resource: Resource,
    action: Action,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let api = client.api::<T>();

    match action {
        Action::Select { id: Some(id), .. } => {
            let record = api
                .find(&id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No record '{}' in {}", id, resource.collection_name()))?;
            output_record(output_format, codec::encode(&record)?)
        }
        Action::Select { id: None, query } => {
            let records = api
                .list(&query)
                .await?
                .iter()
                .map(codec::encode)
                .collect::<Result<Vec<_>, _>>()?;
            output_records(output_format, resource.collection_name(), records)
        }
        Action::Create(body) => {
            let record: T = codec::decode_value(body)?;
            report(output_format, api.insert(&record).await?)
        }
        Action::Update { id, body } => {
            let record: T = codec::decode_value(body)?;
            report(output_format, api.update_by_id(T::ITEM, &id, &record).await?)
        }
        Action::Delete { id } => report(output_format, api.remove(&id).await?),
    }
}

async fn dispatch(
    client: &CrmClient,
    resource: Resource,
    action: Action,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    match resource {
        Resource::Boats => perform::<Boat>(client, resource, action, output_format).await,
        Resource::Companies => perform::<Company>(client, resource, action, output_format).await,
        Resource::Procedures => perform::<Procedure>(client, resource, action, output_format).await,
        Resource::Users => perform::<User>(client, resource, action, output_format).await,
        Resource::People => perform::<Person>(client, resource, action, output_format).await,
        Resource::Guilds => perform::<Guild>(client, resource, action, output_format).await,
        Resource::Notices => perform::<Notice>(client, resource, action, output_format).await,
        Resource::ProcedureTypes => {
            perform::<ProcedureType>(client, resource, action, output_format).await
        }
        Resource::ProcedureStatuses => {
            perform::<ProcedureStatus>(client, resource, action, output_format).await
        }
    }
}

pub async fn handle(cmd: DataCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = build_client()?;

    match cmd {
        DataCommands::Select { resource, id: Some(id), users: true, .. } => {
            if resource != Resource::Companies {
                return Err(anyhow::anyhow!("--users only applies to companies"));
            }
            let users = client
                .company_users(&id)
                .await?
                .iter()
                .map(codec::encode)
                .collect::<Result<Vec<_>, _>>()?;
            output_records(&output_format, "users", users)
        }
        DataCommands::Select { resource, id, filters, includes, .. } => {
            let query = build_query(filters, includes)?;
            dispatch(&client, resource, Action::Select { id, query }, &output_format).await
        }
        DataCommands::Create { resource } => {
            let body = read_stdin_json().await?;
            dispatch(&client, resource, Action::Create(body), &output_format).await
        }
        DataCommands::Update { resource, id } => {
            let body = read_stdin_json().await?;
            dispatch(&client, resource, Action::Update { id, body }, &output_format).await
        }
        DataCommands::Delete { resource, id } => {
            dispatch(&client, resource, Action::Delete { id }, &output_format).await
        }
        DataCommands::Upload { path, endpoint, field, content_type } => {
            let mut options = client.upload_options();
            if let Some(field) = field {
                options = options.with_field_name(field);
            }

            let mut file = UploadFile::from_path(&path, options.max_bytes).await?;
            if let Some(content_type) = content_type {
                file = file.with_content_type(content_type);
            }

            let response = client.api::<Value>().upload(&endpoint, &file, &options).await?;
            if !response.success {
                return Err(anyhow::anyhow!(response.message_or_default()));
            }
            output_success(
                &output_format,
                &format!("Uploaded {} ({} bytes)", file.name, file.size()),
                Some(json!({ "location": response.document_location() })),
            )
        }
    }
}
