//! Domain types for Brewstand.
//!
//! Ingredients and beverages are schema-on-read documents in the backend;
//! this module gives them their typed shape, and defines the client state
//! and every action the reducer understands.

use brewstand_core::document_store::{Document, DocumentId, DocumentStoreError};
use brewstand_core::identity::{SessionUser, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Catalog collection holding beverage bases
pub const BASES: &str = "bases";

/// Catalog collection holding creamers
pub const CREAMERS: &str = "creamers";

/// Catalog collection holding syrups
pub const SYRUPS: &str = "syrups";

/// Collection holding every user's beverage records
pub const BEVERAGES: &str = "beverages";

/// Field of a beverage document naming its owner
pub const USER_ID_FIELD: &str = "userId";

/// A read-only catalog entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Backend document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    /// Display name
    pub name: String,
    /// Display color, as stored (usually a CSS color)
    pub color: String,
}

impl Ingredient {
    /// Creates an ingredient that has not come from the backend
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color: color.into(),
        }
    }

    /// Decodes a catalog document, attaching its backend id
    ///
    /// # Errors
    ///
    /// Returns an error if the document lacks `name` or `color`.
    pub fn from_document(document: &Document) -> Result<Self, serde_json::Error> {
        let mut ingredient = Self::deserialize(&document.fields)?;
        ingredient.id = Some(document.id.clone());
        Ok(ingredient)
    }
}

/// Serving temperature
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    /// Served hot
    #[default]
    Hot,
    /// Served cold
    Cold,
}

impl Temperature {
    /// Every temperature, in display order
    pub const ALL: [Self; 2] = [Self::Hot, Self::Cold];

    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Cold => "cold",
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A composed beverage
///
/// Ingredients are full copies taken when the beverage was made, so later
/// catalog edits never change an existing record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeverageRecord {
    /// Backend document id; `None` until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    /// User-chosen name
    pub name: String,
    /// Base ingredient
    pub base: Ingredient,
    /// Creamer ingredient
    pub creamer: Ingredient,
    /// Syrup ingredient
    pub syrup: Ingredient,
    /// Serving temperature
    pub temp: Temperature,
    /// Owner; written by the composer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl BeverageRecord {
    /// Decodes a beverage document, attaching its backend id
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not have the beverage shape.
    pub fn from_document(document: &Document) -> Result<Self, serde_json::Error> {
        let mut record = Self::deserialize(&document.fields)?;
        record.id = Some(document.id.clone());
        Ok(record)
    }

    /// Document fields to persist; the id is assigned by the backend
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_fields(&self) -> Result<Value, serde_json::Error> {
        let mut fields = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut fields {
            map.remove("id");
        }
        Ok(fields)
    }
}

/// Correlates a request action with the action that answers it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random `RequestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message returned when nobody is signed in
pub const NO_USER_MESSAGE: &str = "No user logged in, please sign in first.";

/// Message returned when a draft option or the name is missing
pub const INCOMPLETE_MESSAGE: &str =
    "Please complete all beverage options and the name before making a beverage.";

/// Message returned when the backend rejects the write
pub const WRITE_FAILED_MESSAGE: &str = "Failed to make beverage.";

/// Outcome category of [`ComposeStatus`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComposeStatusKind {
    /// The record was written
    Created,
    /// Nobody is signed in
    NoUser,
    /// Name blank or an ingredient unselected
    Incomplete,
    /// The backend write failed
    WriteFailed,
}

/// Result of making a beverage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeStatus {
    /// Outcome category
    pub kind: ComposeStatusKind,
    /// Human-readable message
    pub message: String,
    /// Id of the written document, for [`ComposeStatusKind::Created`]
    pub record_id: Option<DocumentId>,
}

impl ComposeStatus {
    /// The record named `name` was written as `record_id`
    #[must_use]
    pub fn created(name: &str, record_id: DocumentId) -> Self {
        Self {
            kind: ComposeStatusKind::Created,
            message: format!("Beverage {name} made successfully!"),
            record_id: Some(record_id),
        }
    }

    /// Nobody is signed in
    #[must_use]
    pub fn no_user() -> Self {
        Self::rejected(ComposeStatusKind::NoUser, NO_USER_MESSAGE)
    }

    /// The draft is incomplete
    #[must_use]
    pub fn incomplete() -> Self {
        Self::rejected(ComposeStatusKind::Incomplete, INCOMPLETE_MESSAGE)
    }

    /// The backend write failed
    #[must_use]
    pub fn write_failed() -> Self {
        Self::rejected(ComposeStatusKind::WriteFailed, WRITE_FAILED_MESSAGE)
    }

    fn rejected(kind: ComposeStatusKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
            record_id: None,
        }
    }

    /// Whether the record was written
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kind == ComposeStatusKind::Created
    }
}

impl fmt::Display for ComposeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Client state
///
/// Catalogs are replaced wholesale on every load, `beverages` on every
/// subscription snapshot. Draft fields are only ever written by the user's
/// own actions and by [`BrewState::show_beverage`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BrewState {
    /// Base catalog, in backend order
    pub bases: Vec<Ingredient>,
    /// Creamer catalog, in backend order
    pub creamers: Vec<Ingredient>,
    /// Syrup catalog, in backend order
    pub syrups: Vec<Ingredient>,

    /// Draft base
    pub current_base: Option<Ingredient>,
    /// Draft creamer
    pub current_creamer: Option<Ingredient>,
    /// Draft syrup
    pub current_syrup: Option<Ingredient>,
    /// Draft temperature
    pub current_temp: Temperature,
    /// Draft name
    pub current_beverage_name: String,

    /// The signed-in user's beverages, as last delivered by the backend
    pub beverages: Vec<BeverageRecord>,
    /// Beverage loaded for display
    pub current_beverage: Option<BeverageRecord>,

    /// Signed-in user
    pub user: Option<SessionUser>,

    /// Bumped on every user change; tags the live subscription
    pub subscription_generation: u64,
    /// Latest catalog load
    pub catalog_request: Option<RequestId>,
    /// Surfaced failure of the latest catalog load
    pub catalog_error: Option<String>,
    /// Surfaced failure of the current subscription
    pub subscription_error: Option<String>,
}

impl BrewState {
    /// Creates an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed temperature options
    #[must_use]
    pub const fn temps(&self) -> &'static [Temperature] {
        &Temperature::ALL
    }

    /// Uid of the signed-in user
    #[must_use]
    pub fn uid(&self) -> Option<&UserId> {
        self.user.as_ref().map(|user| &user.uid)
    }

    /// Whether a user is signed in
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Copies a record's options into the draft and displays it
    pub fn show_beverage(&mut self, record: BeverageRecord) {
        self.current_base = Some(record.base.clone());
        self.current_creamer = Some(record.creamer.clone());
        self.current_syrup = Some(record.syrup.clone());
        self.current_temp = record.temp;
        self.current_beverage = Some(record);
    }
}

/// Every input to [`crate::BrewReducer`]
///
/// User intents carry a [`RequestId`] when the caller waits for an answer;
/// the answering action carries the same id.
#[derive(Clone, Debug)]
pub enum BrewAction {
    // ========== Catalog ==========
    /// Fetch all three catalogs
    LoadIngredients {
        /// Load being started
        request: RequestId,
    },
    /// All three catalogs arrived
    IngredientsLoaded {
        /// Load that produced them
        request: RequestId,
        /// Base catalog
        bases: Vec<Ingredient>,
        /// Creamer catalog
        creamers: Vec<Ingredient>,
        /// Syrup catalog
        syrups: Vec<Ingredient>,
    },
    /// A catalog fetch failed
    IngredientsLoadFailed {
        /// Load that failed
        request: RequestId,
        /// Backend failure
        error: DocumentStoreError,
    },

    // ========== Session ==========
    /// The signed-in identity changed
    SetUser {
        /// New identity, `None` when signed out
        user: Option<SessionUser>,
    },

    // ========== Subscription ==========
    /// Full-replace snapshot of the user's beverages
    BeveragesSnapshot {
        /// Generation of the subscription that delivered it
        generation: u64,
        /// Every beverage the user owns
        beverages: Vec<BeverageRecord>,
    },
    /// The live subscription ended with an error
    SubscriptionFailed {
        /// Generation of the failed subscription
        generation: u64,
        /// Backend failure
        error: DocumentStoreError,
    },

    // ========== Draft ==========
    /// Choose a base
    SelectBase {
        /// New base, `None` to clear
        base: Option<Ingredient>,
    },
    /// Choose a creamer
    SelectCreamer {
        /// New creamer, `None` to clear
        creamer: Option<Ingredient>,
    },
    /// Choose a syrup
    SelectSyrup {
        /// New syrup, `None` to clear
        syrup: Option<Ingredient>,
    },
    /// Choose a temperature
    SelectTemp {
        /// New temperature
        temp: Temperature,
    },
    /// Edit the draft name
    SetBeverageName {
        /// New name
        name: String,
    },
    /// Display a record and copy its options into the draft
    ShowBeverage {
        /// Record to display
        record: BeverageRecord,
    },

    // ========== Composer ==========
    /// Validate the draft and persist it
    MakeBeverage {
        /// Request being answered
        request: RequestId,
    },
    /// Outcome of [`BrewAction::MakeBeverage`]
    BeverageComposed {
        /// Request answered
        request: RequestId,
        /// Outcome
        status: ComposeStatus,
    },
}
