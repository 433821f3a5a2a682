use serde_json::Value;

use domain::rules;
use domain::{
    Contact, Group, GroupContact, User, CONTACTS_COLLECTION, DEFAULT_CONTACT_IMAGE,
    DEFAULT_MAX_CONTACTS, GROUPS_COLLECTION, GROUP_CONTACTS_COLLECTION, USERS_COLLECTION,
};

use crate::store::{DocumentShape, FieldSpec, FieldValidator, SchemaDescriptor};

impl DocumentShape for User {
    const NAME: &'static str = USERS_COLLECTION;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new()
            .field(
                "username",
                FieldSpec::string()
                    .required()
                    .unique()
                    .validate(FieldValidator::rule(&rules::USERNAME)),
            )
            .field(
                "email",
                FieldSpec::string()
                    .required()
                    .validate(FieldValidator::rule(&rules::EMAIL)),
            )
            .field("passwordHash", FieldSpec::string().required())
            .field(
                "image",
                FieldSpec::string().validate(FieldValidator::rule(&rules::IMAGE_URL)),
            )
            .field("dateOfBirth", FieldSpec::date())
            .field(
                "contacts",
                FieldSpec::reference_array(CONTACTS_COLLECTION)
                    .default_value(Value::Array(Vec::new())),
            )
    }
}

impl DocumentShape for Contact {
    const NAME: &'static str = CONTACTS_COLLECTION;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new()
            .field(
                "name",
                FieldSpec::string()
                    .required()
                    .validate(FieldValidator::rule(&rules::CONTACT_NAME)),
            )
            .field(
                "email",
                FieldSpec::string()
                    .required()
                    .validate(FieldValidator::rule(&rules::EMAIL)),
            )
            .field(
                "numbers",
                FieldSpec::string_array()
                    .required()
                    .validate(FieldValidator::min_items(1, rules::PHONE_NUMBER.message()))
                    .validate(FieldValidator::each_rule(&rules::PHONE_NUMBER)),
            )
            .field(
                "image",
                FieldSpec::string()
                    .default_value(DEFAULT_CONTACT_IMAGE)
                    .validate(FieldValidator::rule(&rules::IMAGE_URL)),
            )
            .field("idUser", FieldSpec::reference(USERS_COLLECTION).required())
    }
}

impl DocumentShape for Group {
    const NAME: &'static str = GROUPS_COLLECTION;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new()
            .field(
                "name",
                FieldSpec::string()
                    .required()
                    .validate(FieldValidator::rule(&rules::GROUP_NAME)),
            )
            .field(
                "description",
                FieldSpec::string()
                    .required()
                    .validate(FieldValidator::rule(&rules::GROUP_DESCRIPTION)),
            )
            .field("idUser", FieldSpec::reference(USERS_COLLECTION).required())
            .field(
                "maxContacts",
                FieldSpec::number().default_value(DEFAULT_MAX_CONTACTS),
            )
    }
}

impl DocumentShape for GroupContact {
    const NAME: &'static str = GROUP_CONTACTS_COLLECTION;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new()
            .field("idGroup", FieldSpec::reference(GROUPS_COLLECTION).required())
            .field("idContact", FieldSpec::reference(CONTACTS_COLLECTION).required())
    }
}
