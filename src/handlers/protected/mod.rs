// handlers/protected/mod.rs - Protected handlers (token authentication required)
//
// Every route in this tier sits behind `token_auth_middleware`, applied as a
// route layer so that authentication runs before path and body extraction.

pub mod recipes; // Recipe CRUD
