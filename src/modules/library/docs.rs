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

fn json_response(description: &str, schema: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{}", schema) }
            }
        }
    })
}

fn json_body(schema: Value) -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": schema } }
    })
}

fn book_id_param() -> Value {
    json!({
        "name": "book_id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    })
}

fn status_schema() -> Value {
    json!({ "type": "string", "enum": ["ON_QUEUE", "READING", "READ"] })
}

/// OpenAPI fragment for the library routes, relative to the module mount point.
pub fn openapi() -> Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List library entries ordered by title",
                    "tags": ["Library"],
                    "parameters": [{
                        "name": "status",
                        "in": "query",
                        "required": false,
                        "schema": status_schema()
                    }],
                    "responses": {
                        "200": {
                            "description": "Library entries",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/LibraryEntry" }
                                    }
                                }
                            }
                        },
                        "422": error_response("Unknown status"),
                        "500": error_response("Storage failure")
                    }
                },
                "post": {
                    "summary": "Add a catalog book to the library",
                    "tags": ["Library"],
                    "requestBody": json_body(json!({ "$ref": "#/components/schemas/Book" })),
                    "responses": {
                        "200": json_response("Book was already in the library", "LibraryEntry"),
                        "201": json_response("Book added", "LibraryEntry"),
                        "400": error_response("Malformed body"),
                        "422": error_response("Blank id or title")
                    }
                }
            },
            "/{book_id}": {
                "get": {
                    "summary": "Fetch one library entry",
                    "tags": ["Library"],
                    "parameters": [book_id_param()],
                    "responses": {
                        "200": json_response("Library entry", "LibraryEntry"),
                        "404": error_response("Book is not in the library")
                    }
                },
                "put": {
                    "summary": "Insert or replace a library entry",
                    "tags": ["Library"],
                    "parameters": [book_id_param()],
                    "requestBody": json_body(json!({ "$ref": "#/components/schemas/LibraryEntry" })),
                    "responses": {
                        "200": json_response("Saved entry", "LibraryEntry"),
                        "400": error_response("Malformed body"),
                        "422": error_response("Rating out of range, unknown status or mismatched id")
                    }
                },
                "patch": {
                    "summary": "Edit status, rating and thoughts, saved as one batch",
                    "tags": ["Library"],
                    "parameters": [book_id_param()],
                    "requestBody": json_body(json!({
                        "type": "object",
                        "properties": {
                            "status": status_schema(),
                            "rating": { "type": "integer", "minimum": 0, "maximum": 5 },
                            "thoughts": { "type": "string" }
                        }
                    })),
                    "responses": {
                        "200": json_response("Book stats after saving", "BookStats"),
                        "404": error_response("Book is not in the library"),
                        "422": error_response("Rating out of range or unknown status")
                    }
                },
                "delete": {
                    "summary": "Remove a book from the library; removing an absent book succeeds",
                    "tags": ["Library"],
                    "parameters": [book_id_param()],
                    "responses": {
                        "204": { "description": "Entry absent" }
                    }
                }
            },
            "/{book_id}/status": {
                "put": {
                    "summary": "Move a book to another shelf",
                    "tags": ["Library"],
                    "parameters": [book_id_param()],
                    "requestBody": json_body(json!({
                        "type": "object",
                        "properties": { "status": status_schema() },
                        "required": ["status"]
                    })),
                    "responses": {
                        "200": json_response("Updated entry", "LibraryEntry"),
                        "404": error_response("Book is not in the library"),
                        "422": error_response("Unknown status")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Library health check",
                    "tags": ["Library"],
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
                "LibraryEntry": {
                    "type": "object",
                    "properties": {
                        "book": { "$ref": "#/components/schemas/Book" },
                        "status": status_schema(),
                        "rating": { "type": "integer", "minimum": 0, "maximum": 5 },
                        "thoughts": { "type": "string" }
                    },
                    "required": ["book", "status", "rating"]
                },
                "BookStats": {
                    "type": "object",
                    "properties": {
                        "is_loading": { "type": "boolean" },
                        "book": { "$ref": "#/components/schemas/Book" },
                        "status": status_schema(),
                        "rating": { "type": "integer" },
                        "thoughts": { "type": "string" },
                        "has_changes": { "type": "boolean" },
                        "saving_changes": { "type": "boolean" },
                        "show_delete_dialog": { "type": "boolean" },
                        "show_leave_dialog": { "type": "boolean" },
                        "closed": { "type": "boolean" },
                        "last_error": { "type": ["string", "null"] }
                    }
                }
            }
        }
    })
}
