//! Reverse-proxy configuration rendering.
//!
//! Pure, deterministic text generation: identical field values must produce
//! byte-identical output. No filesystem or process access here.

use std::path::PathBuf;

use crate::config::{ProxyConfig, RunConfig};

/// Value object rendered into the proxy config text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseProxyConfig {
    pub server_names: Vec<String>,
    pub listen_port: u16,
    pub document_root: PathBuf,
    pub index_file: String,
    pub backend_upstream: String,
    pub frontend_upstream: String,
    pub gzip: bool,
    pub security_headers: bool,
    pub static_caching: bool,
    pub proxy_api: bool,
    /// Production serves the built document root; development proxies the
    /// frontend dev server instead.
    pub production: bool,
    pub tls: Option<TlsPaths>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl ReverseProxyConfig {
    /// Build the render input from the run configuration.
    pub fn from_run_config(config: &RunConfig, document_root: PathBuf) -> Self {
        let proxy: &ProxyConfig = &config.proxy;
        let tls = if config.flags.enable_tls {
            match (&proxy.tls_cert, &proxy.tls_key) {
                (Some(cert), Some(key)) => Some(TlsPaths {
                    cert: cert.clone(),
                    key: key.clone(),
                }),
                _ => None,
            }
        } else {
            None
        };

        Self {
            server_names: proxy.server_names.clone(),
            listen_port: proxy.listen_port,
            document_root,
            index_file: "index.html".to_string(),
            backend_upstream: proxy.backend_upstream.clone(),
            frontend_upstream: proxy.frontend_upstream.clone(),
            gzip: true,
            security_headers: true,
            static_caching: true,
            proxy_api: true,
            production: true,
            tls,
        }
    }

    /// Render the config text. Deterministic: field-for-field equal configs
    /// render byte-identical output.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(2048);

        out.push_str("server {\n");
        out.push_str(&format!("    listen {};\n", self.listen_port));
        if let Some(tls) = &self.tls {
            out.push_str("    listen 443 ssl;\n");
            out.push_str(&format!(
                "    ssl_certificate {};\n",
                tls.cert.display()
            ));
            out.push_str(&format!(
                "    ssl_certificate_key {};\n",
                tls.key.display()
            ));
        }
        out.push_str(&format!(
            "    server_name {};\n",
            self.server_names.join(" ")
        ));
        out.push('\n');
        out.push_str(&format!("    root {};\n", self.document_root.display()));
        out.push_str(&format!("    index {};\n", self.index_file));

        if self.gzip {
            out.push('\n');
            out.push_str("    gzip on;\n");
            out.push_str("    gzip_types text/plain text/css application/json application/javascript image/svg+xml;\n");
            out.push_str("    gzip_min_length 1024;\n");
        }

        if self.security_headers {
            out.push('\n');
            out.push_str("    add_header X-Content-Type-Options nosniff;\n");
            out.push_str("    add_header X-Frame-Options SAMEORIGIN;\n");
            out.push_str("    add_header X-XSS-Protection \"1; mode=block\";\n");
        }

        if self.proxy_api {
            out.push('\n');
            out.push_str("    location /api/ {\n");
            out.push_str(&format!("        proxy_pass {};\n", self.backend_upstream));
            out.push_str("        proxy_http_version 1.1;\n");
            out.push_str("        proxy_set_header Host $host;\n");
            out.push_str("        proxy_set_header X-Real-IP $remote_addr;\n");
            out.push_str("        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;\n");
            out.push_str("        proxy_set_header Upgrade $http_upgrade;\n");
            out.push_str("        proxy_set_header Connection \"upgrade\";\n");
            out.push_str("    }\n");
        }

        if self.static_caching {
            out.push('\n');
            out.push_str("    location ~* \\.(css|js|svg|png|jpg|jpeg|gif|ico|woff|woff2)$ {\n");
            out.push_str("        expires 30d;\n");
            out.push_str("        add_header Cache-Control \"public, immutable\";\n");
            out.push_str("    }\n");
            out.push('\n');
            out.push_str("    location ~* \\.html$ {\n");
            out.push_str("        add_header Cache-Control \"no-store\";\n");
            out.push_str("    }\n");
        }

        out.push('\n');
        out.push_str("    location / {\n");
        if self.production {
            out.push_str(&format!(
                "        try_files $uri $uri/ /{};\n",
                self.index_file
            ));
        } else {
            out.push_str(&format!("        proxy_pass {};\n", self.frontend_upstream));
            out.push_str("        proxy_set_header Host $host;\n");
        }
        out.push_str("    }\n");

        out.push('\n');
        out.push_str("    location /health {\n");
        out.push_str("        return 200 \"ok\";\n");
        out.push_str("        add_header Content-Type text/plain;\n");
        out.push_str("    }\n");

        out.push('\n');
        out.push_str("    error_page 404 /404.html;\n");
        out.push_str("    error_page 500 502 503 504 /50x.html;\n");
        out.push_str("}\n");

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReverseProxyConfig {
        ReverseProxyConfig {
            server_names: vec!["example.com".to_string(), "www.example.com".to_string()],
            listen_port: 80,
            document_root: PathBuf::from("/srv/app/dist/frontend"),
            index_file: "index.html".to_string(),
            backend_upstream: "http://127.0.0.1:3000".to_string(),
            frontend_upstream: "http://127.0.0.1:5173".to_string(),
            gzip: true,
            security_headers: true,
            static_caching: true,
            proxy_api: true,
            production: true,
            tls: None,
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = sample();
        let b = sample();
        assert_eq!(a.render(), a.render());
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn test_render_core_directives() {
        let text = sample().render();
        assert!(text.contains("listen 80;"));
        assert!(text.contains("server_name example.com www.example.com;"));
        assert!(text.contains("root /srv/app/dist/frontend;"));
        assert!(text.contains("proxy_pass http://127.0.0.1:3000;"));
        assert!(text.contains("try_files $uri $uri/ /index.html;"));
        assert!(text.contains("return 200 \"ok\";"));
        assert!(text.contains("error_page 500 502 503 504"));
    }

    #[test]
    fn test_render_toggles() {
        let mut config = sample();
        config.gzip = false;
        config.security_headers = false;
        config.static_caching = false;
        config.proxy_api = false;
        let text = config.render();
        assert!(!text.contains("gzip on;"));
        assert!(!text.contains("X-Frame-Options"));
        assert!(!text.contains("Cache-Control"));
        assert!(!text.contains("location /api/"));
    }

    #[test]
    fn test_render_development_mode_proxies_frontend() {
        let mut config = sample();
        config.production = false;
        let text = config.render();
        assert!(text.contains("proxy_pass http://127.0.0.1:5173;"));
        assert!(!text.contains("try_files"));
    }

    #[test]
    fn test_render_tls_directives() {
        let mut config = sample();
        config.tls = Some(TlsPaths {
            cert: PathBuf::from("/etc/ssl/app.crt"),
            key: PathBuf::from("/etc/ssl/app.key"),
        });
        let text = config.render();
        assert!(text.contains("listen 443 ssl;"));
        assert!(text.contains("ssl_certificate /etc/ssl/app.crt;"));
        assert!(text.contains("ssl_certificate_key /etc/ssl/app.key;"));
    }

    #[test]
    fn test_from_run_config() {
        let mut run = RunConfig::default();
        run.proxy.listen_port = 8080;
        let config =
            ReverseProxyConfig::from_run_config(&run, PathBuf::from("/srv/dist/frontend"));
        assert_eq!(config.listen_port, 8080);
        assert!(config.production);
        assert!(config.tls.is_none());

        run.flags.enable_tls = true;
        run.proxy.tls_cert = Some(PathBuf::from("/c.pem"));
        run.proxy.tls_key = Some(PathBuf::from("/k.pem"));
        let with_tls =
            ReverseProxyConfig::from_run_config(&run, PathBuf::from("/srv/dist/frontend"));
        assert!(with_tls.tls.is_some());
    }
}
