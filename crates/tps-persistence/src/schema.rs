//! Esquema Diesel (escrito a mano). Reemplazable con `diesel print-schema`.

diesel::table! {
    step_log (store_id, chain_index, step_number) {
        store_id -> Uuid,
        chain_index -> Integer,
        step_number -> BigInt,
        accepted -> Bool,
        fingerprint -> Text,
        payload -> Jsonb,
        persisted_at -> Timestamptz,
    }
}

diesel::table! {
    model_states (id) {
        id -> BigInt,
        store_id -> Uuid,
        model_key -> Text,
        state -> Jsonb,
        saved_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(step_log, model_states,);
