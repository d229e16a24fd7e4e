use anyhow::Result;
use labdash_core::Dashboard;

pub(super) struct WebServeOptions<'a> {
    pub host: &'a str,
    pub port: u16,
}

pub(super) fn serve(dashboard: Dashboard, options: WebServeOptions<'_>) -> Result<()> {
    labdash_web::serve_web(dashboard, options.host, options.port)
}
