//! Output shape descriptors and coercion of model output into them

use serde_json::{json, Map, Value};

/// Primitive and nested field types
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType
{   String
  , Number
  , Boolean
  , Array(Box<FieldType>)
  , Object(SchemaDescriptor)
}

/// One named field of a descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec
{   pub name: &'static str
  , pub description: &'static str
  , pub ty: FieldType
  , /// Required fields must be present and non-null
    pub required: bool
  , /// Used when the model omits the field
    pub default: Option<Value>
}

impl FieldSpec
{   pub fn required(
      name: &'static str
    , description: &'static str
    , ty: FieldType
    ) -> Self
    {   FieldSpec
        {   name
          , description
          , ty
          , required: true
          , default: None
        }
    }

    /// Optional field, null when absent
    pub fn optional(
      name: &'static str
    , description: &'static str
    , ty: FieldType
    ) -> Self
    {   FieldSpec
        {   name
          , description
          , ty
          , required: false
          , default: None
        }
    }

    pub fn with_default(mut self, default: Value) -> Self
    {   self.required = false;
        self.default = Some(default);
        self
    }
}

/// Structural contract a model answer must satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor
{   pub name: &'static str
  , pub fields: Vec<FieldSpec>
}

impl SchemaDescriptor
{   pub fn new(name: &'static str, fields: Vec<FieldSpec>) -> Self
    {   SchemaDescriptor { name, fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec>
    {   self.fields.iter().find(|f| f.name == name)
    }

    /// Strict JSON Schema: every property listed as required,
    /// optional ones made nullable, no extra properties.
    pub fn to_json_schema(&self) -> Value
    {   let mut properties = Map::new();
        for field in &self.fields
        {   let mut prop = type_schema(&field.ty);
            if !field.required
            {   prop = nullable(prop);
            }
            if let Value::Object(map) = &mut prop
            {   map.insert(
                  "description".to_string(),
                  Value::String(field.description.to_string())
                );
            }
            properties.insert(field.name.to_string(), prop);
        }
        let required: Vec<&str>
          = self.fields.iter().map(|f| f.name).collect();
        json!({
          "type": "object",
          "properties": properties,
          "required": required,
          "additionalProperties": false
        })
    }

    /// Coerce a model answer into this shape.
    ///
    /// Missing fields take their default (or null when optional),
    /// unknown fields are dropped.
    /// Anything else that does not fit is a validation error.
    pub fn coerce(&self, value: Value)
      -> Result<Value, crate::error::Error>
    {   self.coerce_at(self.name, value)
    }

    fn coerce_at(&self, path: &str, value: Value)
      -> Result<Value, crate::error::Error>
    {   let mut input = match value
        {   Value::Object(map) => map
          , other => {
              return Err(invalid(path, "an object", &other));
            }
        };
        let mut out = Map::new();
        for field in &self.fields
        {   let field_path = format!("{}.{}", path, field.name);
            let coerced = match input.remove(field.name)
            {   Some(Value::Null) | None => {
                  if let Some(default) = &field.default
                  {   default.clone()
                  } else if field.required
                  {   return Err(crate::error::Error::Validation(
                        format!("{} is required", field_path)
                      ));
                  } else
                  {   Value::Null
                  }
                }
              , Some(v) => coerce_type(&field_path, &field.ty, v)?
            };
            out.insert(field.name.to_string(), coerced);
        }
        Ok(Value::Object(out))
    }
}

fn coerce_type(path: &str, ty: &FieldType, value: Value)
  -> Result<Value, crate::error::Error>
{   match (ty, value)
    {   (FieldType::String, v @ Value::String(_)) => Ok(v)
      , (FieldType::Number, v @ Value::Number(_)) => Ok(v)
      , (FieldType::Boolean, v @ Value::Bool(_)) => Ok(v)
      , (FieldType::Array(item), Value::Array(items)) => {
          items.into_iter()
            .enumerate()
            .map(|(i, v)| {
              coerce_type(&format!("{}[{}]", path, i), item, v)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
        }
      , (FieldType::Object(schema), v) => schema.coerce_at(path, v)
      , (ty, other) => Err(invalid(path, type_name(ty), &other))
    }
}

fn invalid(path: &str, expected: &str, got: &Value)
  -> crate::error::Error
{   crate::error::Error::Validation(
      format!("{} should be {}, got {}", path, expected, got)
    )
}

fn type_name(ty: &FieldType) -> &'static str
{   match ty
    {   FieldType::String => "a string"
      , FieldType::Number => "a number"
      , FieldType::Boolean => "a boolean"
      , FieldType::Array(_) => "an array"
      , FieldType::Object(_) => "an object"
    }
}

fn type_schema(ty: &FieldType) -> Value
{   match ty
    {   FieldType::String => json!({ "type": "string" })
      , FieldType::Number => json!({ "type": "number" })
      , FieldType::Boolean => json!({ "type": "boolean" })
      , FieldType::Array(item) => json!({
          "type": "array",
          "items": type_schema(item)
        })
      , FieldType::Object(schema) => schema.to_json_schema()
    }
}

fn nullable(mut schema: Value) -> Value
{   if let Some(ty) = schema.get("type").cloned()
    {   if let Value::String(t) = ty
        {   schema["type"] = json!([t, "null"]);
        }
    }
    schema
}
