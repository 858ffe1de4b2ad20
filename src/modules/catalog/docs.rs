use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn session_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/SearchSession" }
            }
        }
    })
}

fn session_id_param() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "format": "uuid" }
    })
}

fn enum_query_param(name: &str, values: &[&str]) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "schema": { "type": "string", "enum": values, "default": values[0] }
    })
}

/// OpenAPI fragment for the catalog routes, relative to the module mount point.
pub fn openapi() -> Value {
    json!({
        "paths": {
            "/search": {
                "get": {
                    "summary": "Fetch one page of catalog results",
                    "tags": ["Catalog"],
                    "parameters": [
                        {
                            "name": "q",
                            "in": "query",
                            "required": true,
                            "schema": { "type": "string" }
                        },
                        enum_query_param("order_by", &["relevance", "newest"]),
                        enum_query_param("print_type", &["all", "books", "magazines"]),
                        enum_query_param("book_type", &["all", "free", "paid"]),
                        {
                            "name": "page_token",
                            "in": "query",
                            "required": false,
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "A page of books",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/SearchPage" }
                                }
                            }
                        },
                        "400": error_response("Blank query or invalid page token"),
                        "502": error_response("Catalog rejected the request"),
                        "503": error_response("Catalog temporarily unavailable; retry")
                    }
                }
            },
            "/sessions": {
                "post": {
                    "summary": "Open a search session",
                    "tags": ["Catalog"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "filters": { "$ref": "#/components/schemas/SearchFilterOptions" }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "201": session_response("Session created"),
                        "400": error_response("Malformed body")
                    }
                }
            },
            "/sessions/{id}": {
                "get": {
                    "summary": "Current state of a search session",
                    "tags": ["Catalog"],
                    "parameters": [session_id_param()],
                    "responses": {
                        "200": session_response("Session state"),
                        "404": error_response("Unknown session")
                    }
                },
                "delete": {
                    "summary": "Close a search session",
                    "tags": ["Catalog"],
                    "parameters": [session_id_param()],
                    "responses": {
                        "204": { "description": "Session closed" },
                        "404": error_response("Unknown session")
                    }
                }
            },
            "/sessions/{id}/search": {
                "post": {
                    "summary": "Start a fresh search, invalidating earlier page tokens",
                    "tags": ["Catalog"],
                    "parameters": [session_id_param()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "query": { "type": "string" },
                                        "filters": { "$ref": "#/components/schemas/SearchFilterOptions" }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": session_response("First page loaded"),
                        "400": error_response("Blank query"),
                        "404": error_response("Unknown session"),
                        "409": error_response("Superseded by a newer search"),
                        "502": error_response("Catalog rejected the request"),
                        "503": error_response("Catalog temporarily unavailable; retry")
                    }
                }
            },
            "/sessions/{id}/more": {
                "post": {
                    "summary": "Append the next page",
                    "tags": ["Catalog"],
                    "parameters": [session_id_param()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": { "page_token": { "type": "string" } },
                                    "required": ["page_token"]
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": session_response("Page appended"),
                        "400": error_response("Malformed page token"),
                        "404": error_response("Unknown session"),
                        "409": error_response("Stale page token or superseded search"),
                        "502": error_response("Catalog rejected the request"),
                        "503": error_response("Catalog temporarily unavailable; retry")
                    }
                }
            },
            "/sessions/{id}/retry": {
                "post": {
                    "summary": "Replay the last failed request",
                    "tags": ["Catalog"],
                    "parameters": [session_id_param()],
                    "responses": {
                        "200": session_response("Request succeeded"),
                        "404": error_response("Unknown session"),
                        "409": error_response("Nothing to retry"),
                        "502": error_response("Catalog rejected the request"),
                        "503": error_response("Catalog temporarily unavailable; retry")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Catalog health check",
                    "tags": ["Catalog"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "Catalog identifier" },
                        "title": { "type": "string" },
                        "authors": { "type": "string", "description": "Comma-separated author names" },
                        "thumbnail": { "type": "string", "format": "uri" }
                    },
                    "required": ["id", "title"]
                },
                "SearchFilterOptions": {
                    "type": "object",
                    "properties": {
                        "order_by": { "type": "string", "enum": ["relevance", "newest"] },
                        "print_type": { "type": "string", "enum": ["all", "books", "magazines"] },
                        "book_type": { "type": "string", "enum": ["all", "free", "paid"] }
                    }
                },
                "SearchPage": {
                    "type": "object",
                    "properties": {
                        "items": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                        "next_page_token": { "type": ["string", "null"] }
                    },
                    "required": ["items"]
                },
                "LoadState": {
                    "type": "object",
                    "properties": {
                        "state": { "type": "string", "enum": ["idle", "loading", "loaded", "failed"] },
                        "message": { "type": "string" },
                        "retryable": { "type": "boolean" }
                    },
                    "required": ["state"]
                },
                "SearchSession": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "query": { "type": "string" },
                        "filters": { "$ref": "#/components/schemas/SearchFilterOptions" },
                        "books": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                        "refresh": { "$ref": "#/components/schemas/LoadState" },
                        "append": { "$ref": "#/components/schemas/LoadState" },
                        "next_page_token": { "type": ["string", "null"] },
                        "end_of_results": { "type": "boolean" },
                        "generation": { "type": "integer", "minimum": 0 }
                    },
                    "required": ["id", "query", "filters", "books", "refresh", "append", "end_of_results", "generation"]
                }
            }
        }
    })
}
