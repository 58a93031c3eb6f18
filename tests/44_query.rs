mod common;

use anyhow::Result;
use common::*;
use maritime_crm::api::Query;
use maritime_crm::dto::Boat;
use url::form_urlencoded;

fn wire_pairs(query: Option<String>) -> Vec<(String, String)> {
    form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}

#[tokio::test]
async fn filters_and_includes_reach_the_backend_once_each() -> Result<()> {
    let server = spawn_backend().await?;
    let client = server.client()?;
    client.login(VALID_EMAIL, VALID_PASSWORD).await?;

    let query = Query::new()
        .filter("activo", true)
        .filter("puerto", "Burela")
        .filter("activo", false)
        .include("BarcosTramites")
        .include("Empresa")
        .include("BarcosTramites");
    client.api::<Boat>().list(&query).await?;

    let calls = server.backend.requests_to("/api/Barcos");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        wire_pairs(calls[0].query.clone()),
        vec![
            ("activo".to_string(), "false".to_string()),
            ("puerto".to_string(), "Burela".to_string()),
            ("includes".to_string(), "BarcosTramites,Empresa".to_string()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn values_are_percent_encoded() -> Result<()> {
    let server = spawn_backend().await?;
    let client = server.client()?;
    client.login(VALID_EMAIL, VALID_PASSWORD).await?;

    let query = Query::new().filter("nombreB", "Virxe & Mar");
    client.api::<Boat>().list(&query).await?;

    let calls = server.backend.requests_to("/api/Barcos");
    let raw = calls[0].query.clone().unwrap_or_default();
    assert!(!raw.contains(' '));
    assert_eq!(
        wire_pairs(Some(raw)),
        vec![("nombreB".to_string(), "Virxe & Mar".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn empty_query_sends_no_query_string() -> Result<()> {
    let server = spawn_backend().await?;
    let client = server.client()?;
    client.login(VALID_EMAIL, VALID_PASSWORD).await?;

    client.api::<Boat>().list(&Query::new()).await?;

    let calls = server.backend.requests_to("/api/Barcos");
    assert_eq!(calls[0].query, None);
    Ok(())
}

#[test]
fn command_line_filters_parse_into_a_query() {
    let query: Query = "censo=27451&includes=Barco, Empresa".parse().unwrap();

    assert_eq!(query.filters(), [("censo".to_string(), "27451".to_string())]);
    assert_eq!(query.included(), ["Barco".to_string(), "Empresa".to_string()]);
    assert_eq!(query.to_query_string(), "censo=27451&includes=Barco%2CEmpresa");
}
