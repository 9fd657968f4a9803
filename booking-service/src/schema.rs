diesel::table! {
    vendors (id) {
        id -> Uuid,
        vendor_id -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        company_name -> Varchar,
        description -> Text,
        address -> Text,
        city -> Varchar,
        state -> Varchar,
        country -> Varchar,
        zip_code -> Varchar,
        phone -> Varchar,
        website -> Varchar,
        status -> Varchar,
        rating -> Float8,
        total_reviews -> Int4,
        is_active -> Bool,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    vendor_service_categories (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        is_active -> Bool,
    }
}

diesel::table! {
    vendor_services (id) {
        id -> Uuid,
        vendor_id -> Uuid,
        category_id -> Uuid,
        name -> Varchar,
        description -> Text,
        base_price -> Numeric,
        is_active -> Bool,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    pricing_tiers (id) {
        id -> Uuid,
        service_id -> Uuid,
        tier_name -> Varchar,
        description -> Text,
        price -> Numeric,
        min_quantity -> Int4,
        max_quantity -> Nullable<Int4>,
        is_active -> Bool,
    }
}

diesel::table! {
    availability_slots (id) {
        id -> Uuid,
        vendor_id -> Uuid,
        service_id -> Uuid,
        date -> Date,
        start_time -> Time,
        end_time -> Time,
        is_available -> Bool,
        max_capacity -> Int4,
        booked_capacity -> Int4,
    }
}

diesel::table! {
    bookings (id) {
        id -> Uuid,
        booking_id -> Varchar,
        vendor_id -> Uuid,
        service_id -> Uuid,
        slot_id -> Uuid,
        customer_name -> Varchar,
        customer_email -> Varchar,
        customer_phone -> Varchar,
        booking_date -> Date,
        start_time -> Time,
        end_time -> Time,
        quantity -> Int4,
        base_price -> Numeric,
        tax_amount -> Numeric,
        platform_fee -> Numeric,
        total_amount -> Numeric,
        status -> Varchar,
        special_requests -> Text,
        cancellation_reason -> Text,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    booking_history (id) {
        id -> Uuid,
        booking_id -> Uuid,
        status -> Varchar,
        notes -> Text,
        created_by -> Nullable<Uuid>,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    notification_outbox (id) {
        id -> Uuid,
        booking_id -> Uuid,
        recipient -> Varchar,
        payload -> Jsonb,
        processed -> Bool,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    vendors,
    vendor_service_categories,
    vendor_services,
    pricing_tiers,
    availability_slots,
    bookings,
    booking_history,
    notification_outbox,
);
