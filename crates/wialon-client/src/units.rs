//! Unit listing and account information

use serde_json::{json, Value};
use tracing::instrument;

use crate::client::Session;
use crate::error::Result;
use crate::flags::{join, UnitFlag};
use crate::types::{SearchItemsResponse, Unit};

/// `type` value requesting minimal account information
const MINIMAL_ACCOUNT_INFO: i64 = 1;

impl Session {
    /// List every unit visible to the user
    ///
    /// `flags` defaults to [`UnitFlag::GeneralProperties`].
    #[instrument(skip(self, flags))]
    pub async fn load_units(&self, flags: Option<&[UnitFlag]>) -> Result<Vec<Unit>> {
        let flags = flags.unwrap_or(&[UnitFlag::GeneralProperties]);
        let response: SearchItemsResponse<Unit> = self
            .call_as(
                "core/search_items",
                json!({
                    "spec": {
                        "itemsType": "avl_unit",
                        "propName": "sys_name",
                        "propValueMask": "*",
                        "propType": "list",
                        "sortType": "sys_name"
                    },
                    "force": 1,
                    "flags": join(flags),
                    "from": 0,
                    "to": 0
                }),
            )
            .await?;
        Ok(response.items)
    }

    /// Minimal data of the user's account
    #[instrument(skip(self))]
    pub async fn get_account_data(&self) -> Result<Value> {
        let account_id = self.require_account_id()?;
        self.call(
            "account/get_account_data",
            json!({ "itemId": account_id, "type": MINIMAL_ACCOUNT_INFO }),
        )
        .await
    }
}
