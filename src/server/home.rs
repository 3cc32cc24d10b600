//! Landing page served at `/`.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;

use crate::server::AppState;

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render(state.port))
}

pub fn render(port: u16) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Ollama Bridge</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; background: #f5f5f5; }}
        .container {{ max-width: 800px; margin: 0 auto; background: white; padding: 30px; border-radius: 10px; }}
        .header {{ text-align: center; margin-bottom: 30px; }}
        pre {{ background: #2d3748; color: #e2e8f0; padding: 15px; border-radius: 5px; overflow-x: auto; }}
        .endpoint {{ background: #f8f9fa; padding: 15px; margin: 15px 0; border-radius: 8px; }}
        .status {{ color: #28a745; font-weight: bold; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Ollama Bridge</h1>
            <p class="status">Server running on port {port}</p>
        </div>

        <h2>Ollama-compatible endpoints</h2>

        <div class="endpoint">
            <h3>GET /api/tags</h3>
            <p>List available models</p>
            <pre>curl http://localhost:{port}/api/tags</pre>
        </div>

        <div class="endpoint">
            <h3>POST /api/generate</h3>
            <p>Generate text completions</p>
            <pre>curl -X POST http://localhost:{port}/api/generate \
  -H "Content-Type: application/json" \
  -d '{{"model":"copilot:latest","prompt":"def fibonacci(n):"}}'</pre>
        </div>

        <div class="endpoint">
            <h3>POST /api/chat</h3>
            <p>Chat-style completions</p>
            <pre>curl -X POST http://localhost:{port}/api/chat \
  -H "Content-Type: application/json" \
  -d '{{"model":"copilot:latest","messages":[{{"role":"user","content":"Write a function"}}]}}'</pre>
        </div>

        <h2>OpenAI-compatible endpoints</h2>

        <div class="endpoint">
            <h3>POST /v1/chat/completions</h3>
            <p>Chat completions with streaming support</p>
            <pre>curl -X POST http://localhost:{port}/v1/chat/completions \
  -H "Content-Type: application/json" \
  -d '{{"model":"test","messages":[{{"role":"user","content":"Hello"}}],"stream":true}}'</pre>
        </div>

        <h2>Client setup</h2>
        <ol>
            <li>Set the Ollama URL to <code>http://localhost:{port}</code></li>
            <li>Select the model <code>copilot:latest</code></li>
        </ol>
    </div>
</body>
</html>
"#
    )
}
