//! Field layouts of the CAT record types.
//!
//! One table per record type, transcribed from the published CAT byte grid.
//! Offsets are 1-based and inclusive. Fields are listed in the published
//! declaration order, which is also the default column order.

use crate::codec::FieldCodec::{self, Code, Date, DateTime, Decimal, Integer, Text};
use crate::models::StorageType::{self, Float32, Float64, Int32, Int64};

/// One row of a declarative record table
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub start: usize,
    pub width: usize,
    pub codec: FieldCodec,
    pub storage: StorageType,
}

const fn field(
    name: &'static str,
    start: usize,
    width: usize,
    codec: FieldCodec,
    storage: StorageType,
) -> FieldDef {
    FieldDef {
        name,
        start,
        width,
        codec,
        storage,
    }
}

/// Text column sized to the field width
const fn text(name: &'static str, start: usize, width: usize, codec: FieldCodec) -> FieldDef {
    field(name, start, width, codec, StorageType::Text(width))
}

const fn decimal(
    name: &'static str,
    start: usize,
    width: usize,
    integer_digits: usize,
    storage: StorageType,
) -> FieldDef {
    field(name, start, width, Decimal { integer_digits }, storage)
}

/// Registro de cabecera (01)
pub const HEADER: &[FieldDef] = &[
    text("tipo_registro", 1, 2, Code),
    // entidad generadora
    text("tipo_entidad_generadora", 3, 1, Code),
    text("codigo_entidad_generadora", 4, 9, Code),
    text("nombre_entidad_generadora", 13, 27, Text),
    // datos del fichero
    field("fecha_hora_generacion", 40, 14, DateTime, StorageType::Text(19)),
    text("tipo_fichero", 54, 4, Text),
    text("descripcion_fichero", 58, 39, Text),
    text("nombre_fichero", 97, 21, Text),
    text("codigo_entidad_destinataria", 118, 3, Code),
    // periodo
    field("fecha_inicio_periodo", 121, 8, Date, StorageType::Text(10)),
    field("fecha_fin_periodo", 129, 8, Date, StorageType::Text(10)),
];

/// Registro de finca (11)
pub const PARCEL: &[FieldDef] = &[
    text("tipo_registro", 1, 2, Code),
    // parcela catastral
    text("codigo_delegacion_meh", 24, 2, Code),
    text("codigo_municipio_dgc", 26, 3, Code),
    text("parcela_catastral", 31, 14, Code),
    // domicilio tributario
    text("codigo_provincia", 51, 2, Code),
    text("nombre_provincia", 53, 25, Text),
    text("codigo_municipio_dgc_domicilio", 78, 3, Code),
    text("codigo_municipio_ine", 81, 3, Code),
    text("nombre_municipio", 84, 40, Text),
    text("nombre_entidad_menor", 124, 30, Text),
    text("codigo_via_dgc", 154, 5, Code),
    text("tipo_via", 159, 5, Code),
    text("nombre_via", 164, 25, Text),
    field("numero", 189, 4, Integer, Int32),
    text("letra", 193, 1, Code),
    field("numero2", 194, 4, Integer, Int32),
    text("letra2", 198, 1, Code),
    decimal("kilometro", 199, 5, 3, Float32),
    text("bloque", 204, 4, Code),
    text("texto_direccion", 216, 25, Text),
    text("codigo_postal", 241, 5, Code),
    text("distrito_municipal", 246, 2, Code),
    text("codigo_municipio_origen_agregacion", 248, 3, Code),
    text("zona_concentracion", 251, 2, Code),
    text("poligono", 253, 3, Code),
    text("parcela", 256, 5, Code),
    text("codigo_paraje", 261, 5, Code),
    text("nombre_paraje", 266, 30, Text),
    // datos físicos
    field("superficie_parcela", 296, 10, Integer, Int64),
    field("superficie_construida", 306, 7, Integer, Int32),
    field("superficie_construida_sobre_rasante", 313, 7, Integer, Int32),
    field("superficie_construida_bajo_rasante", 320, 7, Integer, Int32),
    field("superficie_cubierta", 327, 7, Integer, Int32),
    // coordenadas
    decimal("coordenada_x", 334, 9, 7, Float64),
    decimal("coordenada_y", 343, 10, 8, Float64),
    text("srs", 667, 10, Text),
    // referencia BICE
    text("rc_bice", 582, 20, Code),
    text("denominacion_bice", 602, 65, Text),
];

/// Registro de unidad constructiva (13)
pub const CONSTRUCTION_UNIT: &[FieldDef] = &[
    text("tipo_registro", 1, 2, Code),
    // parcela catastral
    text("codigo_delegacion_meh", 24, 2, Code),
    text("codigo_municipio_dgc", 26, 3, Code),
    text("clase_unidad_constructiva", 29, 2, Code),
    text("parcela_catastral", 31, 14, Code),
    text("codigo_unidad_constructiva", 45, 4, Code),
    // domicilio tributario
    text("codigo_provincia", 51, 2, Code),
    text("nombre_provincia", 53, 25, Text),
    text("codigo_municipio_dgc_domicilio", 78, 3, Code),
    text("codigo_municipio_ine", 81, 3, Code),
    text("nombre_municipio", 84, 40, Text),
    text("nombre_entidad_menor", 124, 30, Text),
    text("codigo_via_dgc", 154, 5, Code),
    text("tipo_via", 159, 5, Code),
    text("nombre_via", 164, 25, Text),
    field("numero", 189, 4, Integer, Int32),
    text("letra", 193, 1, Code),
    field("numero2", 194, 4, Integer, Int32),
    text("letra2", 198, 1, Code),
    decimal("kilometro", 199, 5, 3, Float32),
    text("texto_direccion", 216, 25, Text),
    // datos físicos
    text("año_construccion", 296, 4, Code),
    text("indicador_exactitud_año_construccion", 300, 1, Code),
    field("superficie_suelo_ocupada", 301, 7, Integer, Int32),
    field("longitud_fachada", 308, 5, Integer, Int32),
    text("codigo_unidad_constructiva_matriz", 410, 4, Code),
];

/// Registro de construcción (14)
pub const CONSTRUCTION: &[FieldDef] = &[
    text("tipo_registro", 1, 2, Code),
    // parcela catastral
    text("codigo_delegacion_meh", 24, 2, Code),
    text("codigo_municipio_dgc", 26, 3, Code),
    text("parcela_catastral", 31, 14, Code),
    text("numero_orden_construccion", 45, 4, Code),
    text("numero_cargo", 51, 4, Code),
    text("codigo_unidad_constructiva", 55, 4, Code),
    // localización interior
    text("bloque", 59, 4, Code),
    text("escalera", 63, 2, Code),
    text("planta", 65, 3, Code),
    text("puerta", 68, 3, Code),
    // datos físicos
    text("codigo_destino_dgc", 71, 3, Code),
    text("indicador_reforma", 74, 1, Code),
    field("año_reforma", 75, 4, Integer, Int32),
    field("año_antiguedad_efectiva_catastro", 79, 4, Integer, Int32),
    text("indicador_local_interior", 83, 1, Code),
    field("superficie_total_local_catastro", 84, 7, Integer, Int32),
    field("superficie_porches_terrazas", 91, 7, Integer, Int32),
    field("superficie_otras_plantas", 98, 7, Integer, Int32),
    text("tipologia_constructiva", 105, 5, Code),
    text("codigo_modalidad_reparto", 112, 3, Code),
];

/// Registro de bien inmueble (15)
pub const REAL_ESTATE: &[FieldDef] = &[
    text("tipo_registro", 1, 2, Code),
    // bien inmueble
    text("codigo_delegacion_meh", 24, 2, Code),
    text("codigo_municipio_dgc", 26, 3, Code),
    text("clase_bien_inmueble", 29, 2, Code),
    text("parcela_catastral", 31, 14, Code),
    text("numero_cargo", 45, 4, Code),
    text("caracter_control_1", 49, 1, Code),
    text("caracter_control_2", 50, 1, Code),
    // identificadores adicionales
    text("identificacion_dgc", 51, 8, Code),
    text("identificacion_ayuntamiento", 59, 15, Code),
    text("identificacion_registral", 74, 19, Code),
    // domicilio tributario
    text("codigo_provincia", 93, 2, Code),
    text("nombre_provincia", 95, 25, Text),
    text("codigo_municipio_dgc_domicilio", 120, 3, Code),
    text("codigo_municipio_ine", 123, 3, Code),
    text("nombre_municipio", 126, 40, Text),
    text("nombre_entidad_menor", 166, 30, Text),
    text("codigo_via_dgc", 196, 5, Code),
    text("tipo_via", 201, 5, Code),
    text("nombre_via", 206, 25, Text),
    field("numero", 231, 4, Integer, Int32),
    text("letra", 235, 1, Code),
    field("numero2", 236, 4, Integer, Int32),
    text("letra2", 240, 1, Code),
    decimal("kilometro", 241, 5, 3, Float32),
    text("bloque", 246, 4, Code),
    text("escalera", 250, 2, Code),
    text("planta", 252, 3, Code),
    text("puerta", 255, 3, Code),
    text("texto_direccion", 258, 25, Text),
    text("codigo_postal", 283, 5, Code),
    text("distrito_municipal", 288, 2, Code),
    text("codigo_municipio_origen_agregacion", 290, 3, Code),
    text("zona_concentracion", 293, 2, Code),
    text("poligono", 295, 3, Code),
    text("parcela", 298, 5, Code),
    text("codigo_paraje", 303, 5, Code),
    text("nombre_paraje", 308, 30, Text),
    // información adicional
    text("numero_orden_escritura_lph", 368, 4, Code),
    field("año_antiguedad", 372, 4, Integer, Int32),
    // datos económicos
    text("clave_uso", 428, 1, Code),
    field("superficie_construida", 442, 10, Integer, Int64),
    field("superficie_no_construida", 452, 10, Integer, Int64),
    text("coeficiente_propiedad", 462, 9, Code),
];

/// Registro de reparto de elementos comunes (16)
///
/// Only the first occurrence of the repeating apportionment block is mapped.
pub const COMMON_ELEMENTS: &[FieldDef] = &[
    text("tipo_registro", 1, 2, Code),
    // parcela catastral
    text("codigo_delegacion_meh", 24, 2, Code),
    text("codigo_municipio_dgc", 26, 3, Code),
    text("parcela_catastral", 31, 14, Code),
    text("numero_orden", 45, 4, Code),
    text("calificacion_catastral", 49, 2, Code),
    // bloque de reparto
    text("numero_orden_registro_repartos", 51, 4, Code),
    text("numero_cargo_reparte_elemento_comun", 55, 4, Code),
    decimal("porcentaje_reparto", 59, 6, 3, Float64),
];

/// Registro de cultivos (17)
pub const CROPS: &[FieldDef] = &[
    text("tipo_registro", 1, 2, Code),
    // parcela catastral
    text("codigo_delegacion_meh", 24, 2, Code),
    text("codigo_municipio_dgc", 26, 3, Code),
    text("naturaleza_suelo", 29, 2, Code),
    text("parcela_catastral", 31, 14, Code),
    text("codigo_subparcela", 45, 4, Code),
    text("numero_cargo", 51, 4, Code),
    // datos físicos y económicos
    text("tipo_subparcela", 55, 1, Code),
    field("superficie_subparcela", 56, 10, Integer, Int64),
    text("clase_cultivo", 66, 2, Code),
    text("denominacion_cultivo", 68, 40, Text),
    text("intensidad_productiva", 108, 2, Code),
    text("codigo_modalidad_reparto", 127, 3, Code),
];
