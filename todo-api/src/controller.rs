//! Todo Controller
//!
//! Three endpoints over a [`TodoStore`]:
//!
//! - `POST create`: create a list (`type: "list"`) or add an item to a list
//!   (`type: "item"`)
//! - `GET get`: fetch the root index (`type=root`) or one list (`type=list&name=..`)
//! - `DELETE delete`: remove an item from a list

use lambda_decorator::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::objects::{ListObject, RootObject, TodoObject};
use crate::responses::ErrorCode;
use crate::store::TodoStore;

/// Body of `POST create`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CreateRequest {
    List {
        name: String,
    },
    Item {
        #[serde(rename = "listName")]
        list_name: String,
        item: String,
    },
}

impl CreateRequest {
    fn kind(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Item { .. } => "item",
        }
    }
}

/// Result of `POST create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub success: bool,
    pub message: String,
}

/// Query of `GET get`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GetRequest {
    Root,
    List { name: String },
}

/// Result of `GET get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GetResponse {
    Root(RootObject),
    List(ListObject),
}

/// Body of `DELETE delete`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub list_name: String,
    pub item: String,
}

/// Todo list endpoints.
pub struct TodoController {
    store: Arc<dyn TodoStore>,
}

impl TodoController {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    /// Create a list or add an item to one.
    pub async fn create(&self, request: CreateRequest) -> Result<CreateResponse, HandlerError> {
        let kind = request.kind();

        match request {
            CreateRequest::List { name } => {
                let mut root = self.root().await;
                if root.lists.contains(&name) {
                    return Err(ErrorCode::ListExists.into());
                }
                root.lists.push(name.clone());

                self.persist(root.into()).await?;
                self.persist(ListObject::new(name.as_str()).into()).await?;
                info!(list = %name, "List created");
            }
            CreateRequest::Item { list_name, item } => {
                let mut list = self
                    .list(&list_name)
                    .await
                    .ok_or(ErrorCode::ListNotFound)?;
                list.items.push(item);

                self.persist(list.into()).await?;
                info!(list = %list_name, "Item added");
            }
        }

        Ok(CreateResponse {
            success: true,
            message: format!("Successfully created {kind}"),
        })
    }

    /// Fetch the root index or a single list.
    pub async fn get(&self, request: GetRequest) -> Result<GetResponse, HandlerError> {
        match request {
            GetRequest::Root => Ok(GetResponse::Root(self.root().await)),
            GetRequest::List { name } => self
                .list(&name)
                .await
                .map(GetResponse::List)
                .ok_or_else(|| ErrorCode::ListNotFound.into()),
        }
    }

    /// Remove one occurrence of an item from a list.
    pub async fn delete(&self, request: DeleteRequest) -> Result<ListObject, HandlerError> {
        let mut list = self
            .list(&request.list_name)
            .await
            .ok_or(ErrorCode::ListNotFound)?;

        if let Some(position) = list.items.iter().position(|item| *item == request.item) {
            list.items.remove(position);
        }

        self.persist(list.clone().into()).await?;
        Ok(list)
    }

    /// Root index; an unreadable or absent root reads as empty.
    async fn root(&self) -> RootObject {
        match self.store.get_root().await {
            Ok(root) => root.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Error while fetching root");
                RootObject::default()
            }
        }
    }

    /// List by name; an unreadable list reads as absent.
    async fn list(&self, name: &str) -> Option<ListObject> {
        match self.store.get_list(name).await {
            Ok(list) => list,
            Err(e) => {
                error!(error = %e, list = %name, "Error while fetching list");
                None
            }
        }
    }

    async fn persist(&self, object: TodoObject) -> Result<(), ErrorCode> {
        self.store.put(object).await.map_err(|e| {
            error!(error = %e, "Error while writing object");
            ErrorCode::DatabaseUnreachable
        })
    }
}

fn invalid_parameter() -> LambdaError {
    ErrorCode::InvalidParameter.into()
}

fn is_type(invocation: &Invocation, expected: &str) -> bool {
    invocation.field_str("type") == Some(expected)
}

fn create_schema() -> Schema {
    Schema::new()
        .field("type", PrimitiveType::String)
        .optional("name", PrimitiveType::String)
        .optional("listName", PrimitiveType::String)
        .optional("item", PrimitiveType::String)
}

fn get_schema() -> Schema {
    Schema::new()
        .field("type", PrimitiveType::String)
        .optional("name", PrimitiveType::String)
}

fn delete_schema() -> Schema {
    Schema::new()
        .field("type", PrimitiveType::String)
        .field("listName", PrimitiveType::String)
        .field("item", PrimitiveType::String)
}

impl Controller for TodoController {
    const NAME: &'static str = "TodoController";

    fn register(methods: &mut MethodRegistrar<'_, Self>) -> Result<(), RegistryError> {
        methods
            .add(
                "create",
                Endpoint::post()
                    .json_request(create_schema())
                    .json_response()
                    .with_error(ErrorKind::JSON)
                    .validate_or(
                        |invocation| is_type(invocation, "list") || is_type(invocation, "item"),
                        invalid_parameter(),
                    )
                    .validate_or(
                        |invocation| is_type(invocation, "item") || invocation.field_str("name").is_some(),
                        invalid_parameter(),
                    )
                    .validate_or(
                        |invocation| {
                            is_type(invocation, "list")
                                || (invocation.field_str("listName").is_some()
                                    && invocation.field_str("item").is_some())
                        },
                        invalid_parameter(),
                    )
                    .handler(|todo: Arc<Self>, request: CreateRequest| async move { todo.create(request).await }),
            )?
            .add(
                "get",
                Endpoint::get()
                    .query_request(get_schema())
                    .json_response()
                    .with_error(ErrorKind::JSON)
                    .validate_or(
                        |invocation| {
                            is_type(invocation, "root")
                                || (is_type(invocation, "list") && invocation.field_str("name").is_some())
                        },
                        invalid_parameter(),
                    )
                    .handler(|todo: Arc<Self>, request: GetRequest| async move { todo.get(request).await }),
            )?
            .add(
                "delete",
                Endpoint::delete()
                    .json_request(delete_schema())
                    .json_response()
                    .with_error(ErrorKind::JSON)
                    .handler(|todo: Arc<Self>, request: DeleteRequest| async move { todo.delete(request).await }),
            )?;
        Ok(())
    }
}
