use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteValueRef;
use sqlx::{TypeInfo, Value, ValueRef};
use time::{Date, PrimitiveDateTime, Time};

use crate::Error;

/// Convert a SQLite value to a JSON value.
///
/// BLOBs become base64 strings; DATE, TIME and DATETIME values become their
/// `time` string representations.
pub(crate) fn to_json(v: SqliteValueRef) -> Result<JsonValue, Error> {
   if v.is_null() {
      return Ok(JsonValue::Null);
   }

   let value = ValueRef::to_owned(&v);
   let res = match v.type_info().name() {
      "TEXT" => value
         .try_decode::<String>()
         .map_or(JsonValue::Null, JsonValue::String),
      "REAL" => value
         .try_decode::<f64>()
         .map_or(JsonValue::Null, JsonValue::from),
      "INTEGER" | "NUMERIC" => value
         .try_decode::<i64>()
         .map_or(JsonValue::Null, JsonValue::from),
      "BOOLEAN" => value
         .try_decode::<bool>()
         .map_or(JsonValue::Null, JsonValue::Bool),
      "DATE" => value
         .try_decode::<Date>()
         .map_or(JsonValue::Null, |d| JsonValue::String(d.to_string())),
      "TIME" => value
         .try_decode::<Time>()
         .map_or(JsonValue::Null, |t| JsonValue::String(t.to_string())),
      "DATETIME" => value
         .try_decode::<PrimitiveDateTime>()
         .map_or(JsonValue::Null, |dt| JsonValue::String(dt.to_string())),
      "BLOB" => value
         .try_decode::<Vec<u8>>()
         .map_or(JsonValue::Null, |bytes| JsonValue::String(STANDARD.encode(bytes))),
      "NULL" => JsonValue::Null,
      other => return Err(Error::UnsupportedDatatype(other.to_string())),
   };

   Ok(res)
}
