// Mirrors the tables created by `repository::context::init_schema`.

diesel::table! {
    assignments (id) {
        id -> Integer,
        vehicle_ownership_id -> Integer,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    auto_verify_logs (id) {
        id -> Integer,
        inspection_id -> Integer,
        odo_result -> Text,
        odo_raw -> Text,
        odo_match -> Integer,
        plate_result -> Text,
        plate_raw -> Text,
        plate_match -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    inspection_photos (id) {
        id -> Integer,
        inspection_id -> Integer,
        position_code -> Integer,
        image_url -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    inspections (id) {
        id -> Integer,
        assignment_id -> Integer,
        odometer -> BigInt,
        sequence_number -> Integer,
        start_date -> Text,
        status -> Integer,
        verified_at -> Nullable<Text>,
        processed_at -> Nullable<Text>,
        ocr_verified_at -> Nullable<Text>,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    vehicle_ownerships (id) {
        id -> Integer,
        vehicle_id -> Integer,
        active -> Integer,
        deleted_at -> Nullable<Text>,
    }
}

diesel::table! {
    vehicles (id) {
        id -> Integer,
        license_number -> Text,
        deleted_at -> Nullable<Text>,
    }
}

diesel::joinable!(assignments -> vehicle_ownerships (vehicle_ownership_id));
diesel::joinable!(auto_verify_logs -> inspections (inspection_id));
diesel::joinable!(inspection_photos -> inspections (inspection_id));
diesel::joinable!(inspections -> assignments (assignment_id));
diesel::joinable!(vehicle_ownerships -> vehicles (vehicle_id));

diesel::allow_tables_to_appear_in_same_query!(
    assignments,
    auto_verify_logs,
    inspection_photos,
    inspections,
    vehicle_ownerships,
    vehicles,
);
