use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a mock DNS-over-HTTPS server answering MX queries.
///
/// Each `(domain, hosts)` entry answers GET `/dns-query?name=<domain>&type=MX`
/// with one MX answer per host, in DNS JSON format. Domains not listed get a
/// 404, which the resolver treats as a failed attempt.
pub async fn mock_doh_mx_server(entries: &[(&str, &[&str])]) -> MockServer {
    let server = MockServer::start().await;

    for (domain, hosts) in entries {
        let answers: Vec<serde_json::Value> = hosts
            .iter()
            .enumerate()
            .map(|(i, host)| {
                serde_json::json!({
                    "name": domain,
                    "type": 15,  // MX record type
                    "TTL": 300,
                    "data": format!("{} {}.", (i + 1) * 10, host)
                })
            })
            .collect();

        let response_body = serde_json::json!({
            "Status": 0,
            "TC": false,
            "RD": true,
            "RA": true,
            "AD": false,
            "CD": false,
            "Question": [{
                "name": domain,
                "type": 15
            }],
            "Answer": answers
        });

        Mock::given(method("GET"))
            .and(path("/dns-query"))
            .and(query_param("name", *domain))
            .and(query_param("type", "MX"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(response_body)
                    .insert_header("content-type", "application/dns-json"),
            )
            .mount(&server)
            .await;
    }

    server
}

/// Creates a mock HTTP server that returns the specified HTTP error status code.
pub async fn mock_error_server(status_code: u16) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status_code))
        .mount(&server)
        .await;

    server
}

pub fn doh_url(server: &MockServer) -> String {
    format!("{}/dns-query", server.uri())
}
