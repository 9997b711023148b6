use serde_json::{Map, Value, json};

use crate::domain::rules::FieldType;
use crate::domain::rules::FieldType::{Array, Boolean, Number, String as Text};

/// One accepted field in an upload item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadField {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    /// JSON literal used for generated templates.
    pub example: &'static str,
}

/// Upload contract for one entity endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSchema {
    pub endpoint: &'static str,
    pub api_name: &'static str,
    /// Key wrapping the item array in the request body.
    pub wrapper_key: &'static str,
    pub fields: &'static [UploadField],
}

impl UploadSchema {
    pub fn field(&self, name: &str) -> Option<&'static UploadField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn to_value(&self) -> Value {
        let mut fields = Map::new();
        for field in self.fields {
            fields.insert(
                field.name.to_string(),
                json!({
                    "type": field.field_type.as_str(),
                    "required": field.required,
                    "example": field.example_value(),
                }),
            );
        }
        json!({
            "api_name": self.api_name,
            "method": "POST",
            "wrapper_key": self.wrapper_key,
            "fields": fields,
        })
    }
}

impl UploadField {
    pub fn example_value(&self) -> Value {
        serde_json::from_str(self.example).unwrap_or(Value::Null)
    }
}

const fn field(
    name: &'static str,
    field_type: FieldType,
    required: bool,
    example: &'static str,
) -> UploadField {
    UploadField {
        name,
        field_type,
        required,
        example,
    }
}

const CUSTOMER_FIELDS: &[UploadField] = &[
    field("firmName", Text, false, r#""ABC Traders""#),
    field("contactName", Text, false, r#""John Doe""#),
    field("customerCode", Text, false, r#""CUST001""#),
    field("mobile", Text, false, r#""9876543210""#),
    field("email", Text, false, r#""contact@abc.com""#),
    field("billingAddress", Text, false, r#""""#),
    field("gstNumber", Text, false, r#""""#),
    field("creditLimit", Number, false, "50000"),
    field("creditDays", Number, false, "30"),
    field("pincode", Text, false, r#""400001""#),
    field("city", Text, false, r#""Mumbai""#),
    field("state", Text, false, r#""Maharashtra""#),
    field("priceListCode", Text, false, r#""""#),
    field("routes", Array, false, "[]"),
    field("segments", Array, false, "[]"),
    field("cfa", Array, false, "[]"),
];

const PRODUCT_FIELDS: &[UploadField] = &[
    field("productName", Text, true, r#""Sample Product""#),
    field("skuCode", Text, true, r#""SKU001""#),
    field("taxCategory", Text, false, r#""GST-18""#),
    field("packSize", Text, false, r#""1""#),
    field("displayOrder", Text, false, r#""0""#),
    field("grossWeight", Text, false, r#""0""#),
    field("netWeight", Text, false, r#""0""#),
    field("mrp", Number, false, "100"),
    field("price", Number, false, "90"),
    field("ptr", Number, false, "0"),
    field("isEnabled", Boolean, false, "true"),
    field("caseSize", Text, false, r#""1""#),
    field("maxOrderQuantity", Text, false, r#""0""#),
    field("baseUnit", Text, false, r#""PCK""#),
    field("quantityMultiplier", Text, false, r#""1""#),
    field("categoryCode", Text, false, r#""""#),
    field("productImages", Array, false, "[]"),
    field("shortDescription", Text, false, r#""""#),
    field("upcCode", Text, false, r#""""#),
    field("hsnCode", Text, false, r#""""#),
    field(
        "cfa",
        Array,
        false,
        r#"[{"cfaCode":"MH19","divisionCodes":[{"code":"G001"}],"isActive":1}]"#,
    ),
    field("erpId", Text, false, r#""""#),
    field("additionalUnit", Text, false, r#""""#),
    field("parentSku", Text, false, r#""""#),
];

const PRICELIST_FIELDS: &[UploadField] = &[
    field("name", Text, true, r#""Standard Pricelist""#),
    field("code", Text, true, r#""PL001""#),
    field(
        "products",
        Array,
        true,
        r#"[{"sku":"SKU001","price":90.0,"priceWithMargin":0}]"#,
    ),
    field("startDate", Text, false, r#""2025-01-01""#),
    field("endDate", Text, false, r#""2025-12-31""#),
    field("targetType", Text, false, r#""customer-price""#),
];

pub static UPLOAD_SCHEMAS: [UploadSchema; 3] = [
    UploadSchema {
        endpoint: "customers",
        api_name: "customers",
        wrapper_key: "customers",
        fields: CUSTOMER_FIELDS,
    },
    UploadSchema {
        endpoint: "products",
        api_name: "products",
        wrapper_key: "products",
        fields: PRODUCT_FIELDS,
    },
    UploadSchema {
        endpoint: "pricelist",
        api_name: "price-lists",
        wrapper_key: "priceList",
        fields: PRICELIST_FIELDS,
    },
];

pub fn upload_schema(endpoint: &str) -> Option<&'static UploadSchema> {
    UPLOAD_SCHEMAS
        .iter()
        .find(|schema| schema.endpoint == endpoint)
}

pub fn uploadable_endpoints() -> Vec<&'static str> {
    UPLOAD_SCHEMAS.iter().map(|schema| schema.endpoint).collect()
}

/// All upload schemas keyed by endpoint name.
pub fn upload_schemas_catalog() -> Value {
    let mut catalog = Map::new();
    for schema in &UPLOAD_SCHEMAS {
        catalog.insert(schema.endpoint.to_string(), schema.to_value());
    }
    Value::Object(catalog)
}
