use serde_json::{json, Value};

pub const OPENAPI_VERSION: &str = "3.1.0";

/// OpenAPI description of the public endpoint, advertised on `server_url`.
/// Housekeeping routes (health, plugin manifest, static files) are left out.
pub fn document(server_url: &str) -> Value {
    json!({
        "openapi": OPENAPI_VERSION,
        "info": {
            "title": "Image Search & Upload API",
            "description": "Search an image on Bing and re-host it on imgbb",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "servers": [{ "url": server_url }],
        "paths": {
            "/get_image_url": {
                "get": {
                    "operationId": "get_image_url",
                    "summary": "Find, download and re-host the first matching image",
                    "parameters": [
                        {
                            "name": "product",
                            "in": "query",
                            "required": true,
                            "description": "Product name or keyword to search for",
                            "schema": { "type": "string" }
                        },
                        {
                            "name": "imgbb_key",
                            "in": "query",
                            "required": false,
                            "description": "imgbb API key; the server default is used when omitted",
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "Image hosted",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ImageUrlResponse" }
                                }
                            }
                        },
                        "500": {
                            "description": "Search, download or upload failed",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "ImageUrlResponse": {
                    "type": "object",
                    "required": ["status", "product", "url", "markdown_embed"],
                    "properties": {
                        "status": { "type": "string", "enum": ["success"] },
                        "product": { "type": "string" },
                        "url": { "type": "string", "format": "uri" },
                        "markdown_embed": { "type": "string" }
                    }
                },
                "ErrorResponse": {
                    "type": "object",
                    "required": ["status", "message"],
                    "properties": {
                        "status": { "type": "string", "enum": ["error"] },
                        "message": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_version_and_server() {
        let doc = document("https://relay.example.com");
        assert_eq!(doc["openapi"], "3.1.0");
        assert_eq!(doc["servers"].as_array().unwrap().len(), 1);
        assert_eq!(doc["servers"][0]["url"], "https://relay.example.com");
    }

    #[test]
    fn describes_both_response_envelopes() {
        let doc = document("http://localhost:8000");
        let responses = &doc["paths"]["/get_image_url"]["get"]["responses"];
        assert_eq!(
            responses["200"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/ImageUrlResponse"
        );
        assert_eq!(
            responses["500"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/ErrorResponse"
        );
        assert!(doc["paths"].get("/health").is_none());
    }
}
