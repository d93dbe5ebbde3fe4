//! Todo API
//!
//! Todo list endpoints declared with `lambda-decorator`. [`exports`] builds the
//! handler table the runtime host serves:
//!
//! | Export          | Method | Request                                   |
//! |-----------------|--------|-------------------------------------------|
//! | `createHandler` | POST   | `{type: "list", name}` / `{type: "item", listName, item}` |
//! | `getHandler`    | GET    | `?type=root` / `?type=list&name=..`       |
//! | `deleteHandler` | DELETE | `{type, listName, item}`                  |

pub mod controller;
pub mod objects;
pub mod responses;
pub mod store;

pub use controller::{CreateRequest, CreateResponse, DeleteRequest, GetRequest, GetResponse, TodoController};
pub use objects::{Category, ListObject, RootObject, TodoObject};
pub use responses::{ErrorBody, ErrorCode};
pub use store::{InMemoryStore, StoreError, TodoStore, DEFAULT_TABLE_NAME};

use lambda_decorator::{ExportBuilder, ExportError, HandlerExportTable};
use std::sync::Arc;

/// Build the handler table for the todo endpoints over `store`.
pub fn exports(store: Arc<dyn TodoStore>) -> Result<HandlerExportTable, ExportError> {
    ExportBuilder::new()
        .controller(TodoController::new(store))?
        .build()
}
