//! Usage banner, system information and server time

use chrono::Local;
use hyper::StatusCode;
use serde::Serialize;

use crate::config::RoutesConfig;
use crate::http::Reply;

/// Plain-text overview of the available routes
pub fn banner(routes: &RoutesConfig) -> Reply {
    let text = format!(
        "Bienvenido al servidor de la tienda\n\
         \n\
         GET    {products}            lista de productos\n\
         GET    {products}?id=N       un producto\n\
         POST   {products}            crear (JSON: nombre, precio, descripcion)\n\
         PUT    {products}?id=N       reemplazar\n\
         DELETE {products}?id=N       eliminar\n\
         GET    {read}                 leer el archivo de mensajes\n\
         POST   {create}                reemplazar el archivo con el cuerpo\n\
         PUT    {append}           agregar el cuerpo al archivo\n\
         DELETE {delete}             eliminar el archivo\n\
         GET    {info}                 información del sistema\n\
         GET    {time}                 hora del servidor\n",
        products = routes.products,
        read = routes.read_file,
        create = routes.create_file,
        append = routes.append_file,
        delete = routes.delete_file,
        info = routes.info,
        time = routes.time,
    );
    Reply::text(StatusCode::OK, text)
}

pub fn time() -> Reply {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S %:z");
    Reply::text(StatusCode::OK, format!("Current Server Time: {now}"))
}

/// Host facts reported by `/info`
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub platform: &'static str,
    pub architecture: &'static str,
    /// Bytes
    pub free_memory: Option<u64>,
    /// Bytes
    pub total_memory: Option<u64>,
    /// Seconds
    pub uptime: Option<u64>,
}

impl SystemInfo {
    /// Memory and uptime come from `/proc`; they are `None` where it is missing
    pub async fn collect() -> Self {
        let meminfo = tokio::fs::read_to_string("/proc/meminfo").await.ok();
        let uptime = tokio::fs::read_to_string("/proc/uptime").await.ok();
        let (free_memory, total_memory) = meminfo.as_deref().map_or((None, None), parse_meminfo);

        Self {
            platform: std::env::consts::OS,
            architecture: std::env::consts::ARCH,
            free_memory,
            total_memory,
            uptime: uptime.as_deref().and_then(parse_uptime),
        }
    }
}

pub async fn info() -> Reply {
    let info = SystemInfo::collect().await;
    match serde_json::to_value(&info) {
        Ok(value) => Reply::json(StatusCode::OK, value),
        Err(e) => Reply::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Error interno del servidor" }),
        )
        .with_detail(format!("serialize system info: {e}")),
    }
}

/// `(available, total)` in bytes from `/proc/meminfo` (values are in kB)
fn parse_meminfo(contents: &str) -> (Option<u64>, Option<u64>) {
    let field = |name: &str| {
        contents.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            let kb = rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok()?;
            Some(kb * 1024)
        })
    };
    let free = field("MemAvailable").or_else(|| field("MemFree"));
    (free, field("MemTotal"))
}

/// Whole seconds from the first field of `/proc/uptime`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_uptime(contents: &str) -> Option<u64> {
    let secs = contents.split_whitespace().next()?.parse::<f64>().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(secs as u64)
    } else {
        None
    }
}
