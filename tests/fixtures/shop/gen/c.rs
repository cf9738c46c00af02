// ------------------------------------------------------------------------------
// <auto-generated>
//     This code was generated by a tool.
//
//     Changes to this file may cause incorrect behavior and will be lost if
//     the code is regenerated, except inside preserved regions.
// </auto-generated>
// ------------------------------------------------------------------------------

impl Shop {
    // BEGIN-PRESERVED extra
    // custom note
    // END-PRESERVED extra
}
