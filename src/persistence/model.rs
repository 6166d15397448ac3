use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

/// Continuation token for DynamoDB queries, serialized as a JSON object of
/// the last evaluated key's string attributes.
pub struct PageKey {
    keys: HashMap<String, String>,
}

impl PageKey {
    pub fn from_attribute_values(values: HashMap<String, AttributeValue>) -> Self {
        let keys = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_s().map_or(String::new(), |v| v.to_string())))
            .collect();
        Self { keys }
    }

    pub fn to_attribute_values(&self) -> HashMap<String, AttributeValue> {
        self.keys
            .iter()
            .map(|(k, v)| (k.to_string(), AttributeValue::S(v.to_string())))
            .collect()
    }

    pub fn to_next_page_key(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.keys)
    }

    pub fn from_next_page_key(keys: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            keys: serde_json::from_str(keys)?,
        })
    }
}

pub struct QueryResult<T> {
    pub items: Vec<T>,
    pub next_page_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_key_survives_the_token_format() {
        let values = HashMap::from([
            ("project_id".to_string(), AttributeValue::S("proj-001".to_string())),
            ("id".to_string(), AttributeValue::S("tc-0007".to_string())),
        ]);
        let token = PageKey::from_attribute_values(values.clone()).to_next_page_key().unwrap();
        let restored = PageKey::from_next_page_key(&token).unwrap().to_attribute_values();
        assert_eq!(restored, values);
    }
}
