use chrono::Local;
use log::{debug, info};
use rocket::response::content::RawHtml;
use rocket::serde::json::{Error as JsonError, Json};
use rocket::serde::Serialize;
use rocket::http::Status;
use rocket::{catch, catchers, delete, get, post, put, routes, Build, Request, Rocket, State};
use std::net::IpAddr;
use std::num::ParseIntError;
use std::sync::Arc;

use crate::error::{parse_body, ApiResult, ErrorBody};
use crate::mirror::rest_mirror::DEFAULT_MIRROR_TABLE;
use crate::mirror::{
    MemoryMirror, MirrorDispatcher, MirrorError, MirrorHealth, MirrorRow, RecordMirror, RestMirror,
};
use crate::pages;
use crate::record::{NewRecord, Record, RecordId};
use crate::store::{RecordStore, SharedStore};

pub const DEFAULT_PORT: u16 = 8000;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Response Bodies ------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RootStatus {
    message: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct Health {
    status: &'static str,
    total_items: usize,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct MirrorHealthReport {
    status: &'static str,
    total_items: usize,
    mirror: MirrorHealth,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse {
    message: String,
    data: Record,
    total_items: usize,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct BulkResponse {
    message: String,
    data: Vec<Record>,
    total_items: usize,
}

// Routes ---------------------------------------------------------------------

#[get("/")]
fn root() -> Json<RootStatus> {
    Json(RootStatus {
        message: "Simple Data Service is running!",
        status: "healthy",
    })
}

#[get("/health")]
async fn health(store: &State<SharedStore>) -> Json<Health> {
    let total_items = store.read().await.len();
    Json(Health {
        status: "healthy",
        total_items,
    })
}

#[get("/health/mirror")]
async fn mirror_health(
    store: &State<SharedStore>,
    mirror: &State<MirrorDispatcher>,
) -> Json<MirrorHealthReport> {
    let total_items = store.read().await.len();
    let mirror = mirror.probe().await;
    Json(MirrorHealthReport {
        status: "healthy",
        total_items,
        mirror,
    })
}

#[get("/data")]
async fn get_all_data(store: &State<SharedStore>) -> Json<Vec<Record>> {
    Json(store.read().await.get_all().to_vec())
}

#[get("/data/<id>")]
async fn get_data(id: RecordId, store: &State<SharedStore>) -> ApiResult<Json<Record>> {
    let store = store.read().await;
    Ok(Json(store.get(id)?.clone()))
}

#[post("/data", data = "<body>")]
async fn create_data(
    body: Result<Json<NewRecord>, JsonError<'_>>,
    store: &State<SharedStore>,
    mirror: &State<MirrorDispatcher>,
) -> ApiResult<Json<DataResponse>> {
    let new = parse_body(body)?;
    let (record, total_items) = store.write().await.insert(new)?;
    info!("Created record {} ({} stored)", record.id, total_items);
    mirror.forward(&record);
    Ok(Json(DataResponse {
        message: String::from("Data created successfully"),
        data: record,
        total_items,
    }))
}

#[put("/data/<id>", data = "<body>")]
async fn update_data(
    id: RecordId,
    body: Result<Json<NewRecord>, JsonError<'_>>,
    store: &State<SharedStore>,
    mirror: &State<MirrorDispatcher>,
) -> ApiResult<Json<DataResponse>> {
    let new = parse_body(body)?;
    let (record, total_items) = store.write().await.update(id, new)?;
    info!("Updated record {}", record.id);
    mirror.forward(&record);
    Ok(Json(DataResponse {
        message: String::from("Data updated successfully"),
        data: record,
        total_items,
    }))
}

#[delete("/data/<id>")]
async fn delete_data(id: RecordId, store: &State<SharedStore>) -> ApiResult<Json<DataResponse>> {
    let (record, total_items) = store.write().await.delete(id)?;
    info!("Deleted record {} ({} stored)", record.id, total_items);
    Ok(Json(DataResponse {
        message: String::from("Data deleted successfully"),
        data: record,
        total_items,
    }))
}

#[post("/data/bulk", data = "<body>")]
async fn create_bulk_data(
    body: Result<Json<Vec<NewRecord>>, JsonError<'_>>,
    store: &State<SharedStore>,
    mirror: &State<MirrorDispatcher>,
) -> ApiResult<Json<BulkResponse>> {
    let items = parse_body(body)?;
    let (created, total_items) = store.write().await.bulk_insert(items)?;
    info!("Bulk created {} records ({} stored)", created.len(), total_items);
    mirror.forward_all(&created);
    Ok(Json(BulkResponse {
        message: format!("Created {} items successfully", created.len()),
        data: created,
        total_items,
    }))
}

#[get("/test1")]
fn test_page() -> RawHtml<String> {
    RawHtml(pages::test_page())
}

#[get("/test1/mydata")]
async fn my_data_page(store: &State<SharedStore>) -> RawHtml<String> {
    let rendered_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let store = store.read().await;
    RawHtml(pages::my_data_page(store.get_all(), &rendered_at))
}

#[get("/test1/<value>")]
async fn data_from_url(
    value: String,
    store: &State<SharedStore>,
    mirror: &State<MirrorDispatcher>,
) -> ApiResult<RawHtml<String>> {
    let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let (record, total_items) = {
        let mut store = store.write().await;
        let new = NewRecord::new(format!("URL Data #{}", store.next_id()), value.into())
            .with_description(format!("Data sent via URL at {}", now));
        store.insert(new)?
    };
    info!("Created record {} from url ({} stored)", record.id, total_items);
    mirror.forward(&record);
    Ok(RawHtml(pages::url_data_page(&record, total_items)))
}

#[get("/mirror/data")]
async fn mirror_data(mirror: &State<MirrorDispatcher>) -> ApiResult<Json<Vec<MirrorRow>>> {
    Ok(Json(mirror.fetch_rows().await?))
}

#[get("/mirror/view")]
async fn mirror_view(mirror: &State<MirrorDispatcher>) -> RawHtml<String> {
    let rendered_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let rows = mirror.fetch_rows().await;
    RawHtml(pages::mirror_page(rows.as_deref(), &rendered_at))
}

// Catchers -------------------------------------------------------------------

#[catch(404)]
fn not_found(req: &Request) -> Json<ErrorBody> {
    debug!("No route for {} {}", req.method(), req.uri());
    Json(ErrorBody::new("Not Found"))
}

#[catch(422)]
fn unprocessable(_req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody::new("Unprocessable Entity"))
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody::new(status.reason_lossy()))
}

// Server Node ----------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: IpAddr,
    pub mirror_url: Option<String>,
    pub mirror_api_key: Option<String>,
    pub mirror_table: String,
    pub use_memory_mirror: bool,
}

impl ServerConfig {
    /// Picks the listening port: an explicit flag wins over the `PORT`
    /// environment value, and `DEFAULT_PORT` applies when neither is set.
    pub fn resolve_port(flag: Option<&str>, env: Option<&str>) -> Result<u16, ParseIntError> {
        match flag.or(env) {
            Some(port) => port.trim().parse::<u16>(),
            None => Ok(DEFAULT_PORT),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            address: IpAddr::from([0, 0, 0, 0]),
            mirror_url: None,
            mirror_api_key: None,
            mirror_table: String::from(DEFAULT_MIRROR_TABLE),
            use_memory_mirror: false,
        }
    }
}

pub struct ServerNode {
    store: SharedStore,
    mirror: MirrorDispatcher,
    port: u16,
    address: IpAddr,
}

impl ServerNode {
    pub fn new(config: ServerConfig) -> Result<Self, MirrorError> {
        let mirror: Option<Arc<dyn RecordMirror>> = if config.use_memory_mirror {
            info!("Using in-memory mirror.");
            Some(Arc::new(MemoryMirror::new()))
        } else if let Some(url) = &config.mirror_url {
            let api_key = config.mirror_api_key.clone().unwrap_or_default();
            let mirror = RestMirror::new(url, api_key, config.mirror_table.clone())?;
            info!("Using REST mirror at {}.", mirror.table_url());
            Some(Arc::new(mirror))
        } else {
            info!("No mirror configured; writes stay local.");
            None
        };
        Ok(Self::with_mirror(config, mirror))
    }

    pub fn with_mirror(config: ServerConfig, mirror: Option<Arc<dyn RecordMirror>>) -> Self {
        ServerNode {
            store: RecordStore::shared(),
            mirror: MirrorDispatcher::new(mirror),
            port: config.port,
            address: config.address,
        }
    }

    pub fn build(&self) -> Rocket<Build> {
        rocket::build()
            .configure(
                rocket::Config::figment()
                    .merge(("port", self.port))
                    .merge(("address", self.address)),
            )
            .manage(self.store.clone())
            .manage(self.mirror.clone())
            .mount(
                "/",
                routes![
                    root,
                    health,
                    mirror_health,
                    get_all_data,
                    get_data,
                    create_data,
                    update_data,
                    delete_data,
                    create_bulk_data,
                    test_page,
                    my_data_page,
                    data_from_url,
                    mirror_data,
                    mirror_view,
                ],
            )
            .register("/", catchers![not_found, unprocessable, default_catcher])
    }
}
